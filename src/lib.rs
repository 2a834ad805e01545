//! Group photo collage engine.
//!
//! Given a group's members and a template choice, the engine lays out slots, assigns photos to
//! them, composites everything onto one surface, and emits a PNG tagged with a print
//! resolution.
//!
//! # Pipeline overview
//!
//! 1. **Layout**: a [`TemplateVariant`] becomes an ordered slot list `[center, ...border]`,
//!    either generated on a grid ([`template::grid`]) or extracted from an SVG polygon template
//!    ([`template::svg`]).
//! 2. **Assign**: members are mapped onto slots, missing photos get alternating placeholders
//!    ([`compose::assign`]).
//! 3. **Composite**: photos are loaded in parallel, cover-fit, and clipped to their slot
//!    ([`render::composite`]).
//! 4. **Encode**: PNG encoding plus a `pHYs` chunk ([`encode::png_dpi`]).
//!
//! [`Engine`] ties the steps together; [`RenderVariant`] renders each variant at most once.
#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod render;
pub mod template;

pub use assets::decode::{PreparedImage, decode_image};
pub use assets::photo::{DefaultPhotoLoader, PhotoLoader, PhotoSource};
pub use compose::assign::{Member, PhotoAssignment, Placeholders, SlotPhotoMap, assign};
pub use config::EngineConfig;
pub use encode::png_dpi::{crc32, embed_dpi, read_phys, try_embed_dpi};
pub use foundation::core::{Rgba8, ViewBox};
pub use foundation::error::{CollageError, CollageResult, TemplateFamily};
pub use render::composite::{CompositeStyle, RawImage, composite, encode_png};
pub use render::variant::{Engine, RenderRequest, RenderVariant, RenderedVariant};
pub use template::Slot;
pub use template::catalog::{
    SlotLayout, TemplateVariant, available_templates, build_slots, initial_template_index,
};
pub use template::grid::{GridLayout, GridMetrics, SlotKind, SlotSpec};
pub use template::registry::HexTemplateRegistry;
pub use template::svg::{ExtractedTemplate, ParsedSlot, extract_svg};
