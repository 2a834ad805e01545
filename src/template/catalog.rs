use crate::foundation::core::ViewBox;
use crate::foundation::error::{CollageResult, TemplateFamily};
use crate::template::Slot;
use crate::template::grid::{self, GridMetrics};
use crate::template::registry::{self, HexTemplateRegistry};

/// A concrete template choice: family plus the border member count it was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariant {
    pub family: TemplateFamily,
    pub member_count: u32,
}

/// Slots ready for assignment plus the coordinate window they live in.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotLayout {
    pub view_box: ViewBox,
    pub slots: Vec<Slot>,
}

/// Template variants that can lay out `member_count` border members, grid first.
pub fn available_templates(
    member_count: u32,
    registry: &HexTemplateRegistry,
) -> Vec<TemplateVariant> {
    let mut out = Vec::with_capacity(2);
    if grid::is_supported(member_count) {
        out.push(TemplateVariant {
            family: TemplateFamily::Grid,
            member_count,
        });
    }
    if registry.contains(member_count) {
        out.push(TemplateVariant {
            family: TemplateFamily::Hexagon,
            member_count,
        });
    }
    out
}

/// Default selection: the preferred family if offered, otherwise the first template.
pub fn initial_template_index(
    templates: &[TemplateVariant],
    preferred: Option<TemplateFamily>,
) -> Option<usize> {
    if templates.is_empty() {
        return None;
    }
    preferred
        .and_then(|family| templates.iter().position(|t| t.family == family))
        .or(Some(0))
}

/// Compute a fresh slot list for `variant`.
#[tracing::instrument(level = "debug", skip(registry, metrics))]
pub fn build_slots(
    variant: TemplateVariant,
    registry: &HexTemplateRegistry,
    metrics: &GridMetrics,
) -> CollageResult<SlotLayout> {
    match variant.family {
        TemplateFamily::Grid => {
            let layout = grid::generate(variant.member_count)?;
            Ok(SlotLayout {
                view_box: layout.view_box(metrics),
                slots: layout.to_slots(metrics),
            })
        }
        TemplateFamily::Hexagon => {
            let handle = registry.resolve(variant.member_count)?;
            let template = registry::extract(&handle)?;
            Ok(SlotLayout {
                view_box: template.view_box,
                slots: template.to_slots()?,
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/catalog.rs"]
mod tests;
