//! Slot layouts: the grid generator, the SVG polygon templates, and the catalog that picks
//! between them.

/// Template selection helpers shared by both families.
pub mod catalog;
/// Programmatic ring/band layouts.
pub mod grid;
/// Member count to SVG asset registry.
pub mod registry;
/// Polygon extraction, classification, and ordering for SVG templates.
pub mod svg;

use crate::foundation::core::{BezPath, Rect};

/// A drawable slot in view box units. Both template families end up as `Vec<Slot>` ordered
/// `[center, ...border]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub id: String,
    /// Closed outline used for fill, stroke, and clipping.
    pub path: BezPath,
    /// Axis-aligned bounds of `path`, used for cover-fit photo placement.
    pub bbox: Rect,
    pub is_center: bool,
}
