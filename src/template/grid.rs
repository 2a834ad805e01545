//! Grid template family: one parametric ring/band layout for every supported member count.
//!
//! A layout is a `row_span x col_span` center block wrapped by an innermost perimeter (one top
//! row, `side_cols` flanking columns on each side, one bottom row), plus tapered extension bands
//! stacked above and below until every border member has a cell.
//!
//! Border indices follow emission order: outermost top band down to the innermost top band, the
//! top row, the left columns, the right columns, the bottom row, then bottom bands outward. Photo
//! assignment depends on this order.

use std::ops::RangeInclusive;

use crate::foundation::core::{BezPath, Rect, ViewBox};
use crate::foundation::error::{CollageError, CollageResult, TemplateFamily};
use crate::template::Slot;

/// Position class of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotKind {
    TopExtMost,
    TopExt,
    Top,
    Left,
    Center,
    Right,
    Bottom,
    BottomExt,
    BottomMostExt,
}

/// One cell of a grid layout in virtual grid coordinates.
///
/// `row`/`col` are whole numbers except for extension bands whose width has a different parity
/// than the perimeter width; those are shifted by half a cell to stay centered.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSpec {
    pub kind: SlotKind,
    /// `-1` for the center cell, otherwise the border position `0..N`.
    pub index: i32,
    pub row: f64,
    pub col: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u32>,
}

impl SlotSpec {
    pub fn is_center(&self) -> bool {
        self.index < 0
    }

    pub fn row_span(&self) -> u32 {
        self.row_span.unwrap_or(1)
    }

    pub fn col_span(&self) -> u32 {
        self.col_span.unwrap_or(1)
    }
}

/// Center-block dimensions shared by a contiguous range of member counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockFamily {
    pub members: RangeInclusive<u32>,
    pub row_span: u32,
    pub col_span: u32,
    pub side_cols: u32,
}

impl BlockFamily {
    /// Width of the top/bottom perimeter rows (center plus both flanks).
    pub fn band_width(&self) -> u32 {
        self.col_span + 2 * self.side_cols
    }

    /// Number of border cells in the innermost perimeter.
    pub fn perimeter_capacity(&self) -> u32 {
        2 * self.band_width() + 2 * self.side_cols * self.row_span
    }
}

/// Supported member counts and their center blocks.
pub fn block_families() -> [BlockFamily; 3] {
    [
        BlockFamily {
            members: 28..=50,
            row_span: 6,
            col_span: 6,
            side_cols: 1,
        },
        BlockFamily {
            members: 51..=75,
            row_span: 5,
            col_span: 5,
            side_cols: 2,
        },
        BlockFamily {
            members: 76..=100,
            row_span: 5,
            col_span: 5,
            side_cols: 3,
        },
    ]
}

/// Smallest and largest member counts the grid family can lay out.
pub fn supported_range() -> RangeInclusive<u32> {
    let families = block_families();
    *families[0].members.start()..=*families[families.len() - 1].members.end()
}

pub fn is_supported(member_count: u32) -> bool {
    family_for(member_count).is_some()
}

fn family_for(member_count: u32) -> Option<BlockFamily> {
    block_families()
        .into_iter()
        .find(|f| f.members.contains(&member_count))
}

/// Extension band before row/column placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Band {
    level: u32,
    width: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ExtensionPlan {
    /// Innermost first.
    top: Vec<Band>,
    /// Innermost first.
    bottom: Vec<Band>,
}

impl ExtensionPlan {
    fn cells(bands: &[Band]) -> u32 {
        bands.iter().map(|b| b.width).sum()
    }
}

fn plan_extensions(family: &BlockFamily, member_count: u32) -> CollageResult<ExtensionPlan> {
    let width = family.band_width();
    let mut remaining = member_count.saturating_sub(family.perimeter_capacity());
    let mut plan = ExtensionPlan::default();
    let mut level = 1u32;

    while remaining > 0 {
        let taper = 2 * (level - 1);
        if taper >= width {
            return Err(CollageError::template_not_found(
                TemplateFamily::Grid,
                member_count,
            ));
        }
        let cap = width - taper;

        if remaining >= 2 * cap {
            plan.top.push(Band { level, width: cap });
            plan.bottom.push(Band { level, width: cap });
            remaining -= 2 * cap;
        } else if remaining > cap {
            let larger = remaining.div_ceil(2);
            let smaller = remaining - larger;
            let (top, bottom) = if level % 2 == 1 {
                (smaller, larger)
            } else {
                (larger, smaller)
            };
            plan.top.push(Band { level, width: top });
            plan.bottom.push(Band {
                level,
                width: bottom,
            });
            remaining = 0;
        } else {
            let band = Band {
                level,
                width: remaining,
            };
            if ExtensionPlan::cells(&plan.top) < ExtensionPlan::cells(&plan.bottom) {
                plan.top.push(band);
            } else {
                plan.bottom.push(band);
            }
            remaining = 0;
        }
        level += 1;
    }

    Ok(plan)
}

/// Generated grid layout: the center cell followed by border cells in index order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    pub member_count: u32,
    /// Perimeter band width in cells.
    pub width: u32,
    /// Total number of virtual rows.
    pub rows: u32,
    pub slots: Vec<SlotSpec>,
}

/// Build the layout for `member_count` border members.
#[tracing::instrument(level = "debug")]
pub fn generate(member_count: u32) -> CollageResult<GridLayout> {
    let family = family_for(member_count)
        .ok_or_else(|| CollageError::template_not_found(TemplateFamily::Grid, member_count))?;
    let plan = plan_extensions(&family, member_count)?;

    let width = family.band_width();
    let top_levels = plan.top.len() as u32;
    let bottom_levels = plan.bottom.len() as u32;
    let top_row = top_levels;
    let bottom_row = top_row + family.row_span + 1;

    let mut slots = Vec::with_capacity(member_count as usize + 1);
    slots.push(SlotSpec {
        kind: SlotKind::Center,
        index: -1,
        row: f64::from(top_row + 1),
        col: f64::from(family.side_cols),
        row_span: Some(family.row_span),
        col_span: Some(family.col_span),
    });

    let mut next_index = 0i32;
    let mut emit = |slots: &mut Vec<SlotSpec>, kind: SlotKind, row: u32, col: f64| {
        slots.push(SlotSpec {
            kind,
            index: next_index,
            row: f64::from(row),
            col,
            row_span: None,
            col_span: None,
        });
        next_index += 1;
    };

    for band in plan.top.iter().rev() {
        let kind = if band.level == 1 {
            SlotKind::TopExt
        } else {
            SlotKind::TopExtMost
        };
        let row = top_row - band.level;
        let start = centered_start(width, band.width);
        for j in 0..band.width {
            emit(&mut slots, kind, row, start + f64::from(j));
        }
    }

    for c in 0..width {
        emit(&mut slots, SlotKind::Top, top_row, f64::from(c));
    }

    let right_start = family.side_cols + family.col_span;
    for r in 1..=family.row_span {
        for c in 0..family.side_cols {
            emit(&mut slots, SlotKind::Left, top_row + r, f64::from(c));
        }
    }
    for r in 1..=family.row_span {
        for c in 0..family.side_cols {
            emit(
                &mut slots,
                SlotKind::Right,
                top_row + r,
                f64::from(right_start + c),
            );
        }
    }

    for c in 0..width {
        emit(&mut slots, SlotKind::Bottom, bottom_row, f64::from(c));
    }

    for band in &plan.bottom {
        let kind = if band.level == 1 {
            SlotKind::BottomExt
        } else {
            SlotKind::BottomMostExt
        };
        let row = bottom_row + band.level;
        let start = centered_start(width, band.width);
        for j in 0..band.width {
            emit(&mut slots, kind, row, start + f64::from(j));
        }
    }

    debug_assert_eq!(next_index as u32, member_count);

    Ok(GridLayout {
        member_count,
        width,
        rows: top_levels + family.row_span + 2 + bottom_levels,
        slots,
    })
}

fn centered_start(total: u32, band: u32) -> f64 {
    f64::from(total - band) / 2.0
}

/// Physical sizing of grid cells, in view box units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridMetrics {
    pub cell: f64,
    pub gap: f64,
    pub margin: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            cell: 120.0,
            gap: 6.0,
            margin: 24.0,
        }
    }
}

impl GridMetrics {
    pub fn validate(&self) -> CollageResult<()> {
        if !(self.cell.is_finite() && self.cell > 0.0) {
            return Err(CollageError::validation("grid cell size must be > 0"));
        }
        if !(self.gap.is_finite() && self.gap >= 0.0 && self.gap < self.cell) {
            return Err(CollageError::validation(
                "grid gap must be >= 0 and smaller than the cell size",
            ));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(CollageError::validation("grid margin must be >= 0"));
        }
        Ok(())
    }
}

impl GridLayout {
    pub fn center(&self) -> &SlotSpec {
        &self.slots[0]
    }

    pub fn border(&self) -> &[SlotSpec] {
        &self.slots[1..]
    }

    pub fn view_box(&self, m: &GridMetrics) -> ViewBox {
        ViewBox {
            x: 0.0,
            y: 0.0,
            width: 2.0 * m.margin + f64::from(self.width) * m.cell,
            height: 2.0 * m.margin + f64::from(self.rows) * m.cell,
        }
    }

    pub fn cell_rect(&self, spec: &SlotSpec, m: &GridMetrics) -> Rect {
        let half_gap = m.gap / 2.0;
        let x0 = m.margin + spec.col * m.cell + half_gap;
        let y0 = m.margin + spec.row * m.cell + half_gap;
        let x1 = m.margin + (spec.col + f64::from(spec.col_span())) * m.cell - half_gap;
        let y1 = m.margin + (spec.row + f64::from(spec.row_span())) * m.cell - half_gap;
        Rect::new(x0, y0, x1, y1)
    }

    /// Rectangular slot shapes ordered `[center, ...border]`.
    pub fn to_slots(&self, m: &GridMetrics) -> Vec<Slot> {
        self.slots
            .iter()
            .map(|spec| {
                let bbox = self.cell_rect(spec, m);
                let mut path = BezPath::new();
                path.move_to((bbox.x0, bbox.y0));
                path.line_to((bbox.x1, bbox.y0));
                path.line_to((bbox.x1, bbox.y1));
                path.line_to((bbox.x0, bbox.y1));
                path.close_path();
                let id = if spec.is_center() {
                    "center".to_string()
                } else {
                    format!("cell-{}", spec.index)
                };
                Slot {
                    id,
                    path,
                    bbox,
                    is_center: spec.is_center(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/grid.rs"]
mod tests;
