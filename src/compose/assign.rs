use crate::assets::photo::PhotoSource;
use crate::template::Slot;

/// A group member as seen by the engine.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub photo: Option<PhotoSource>,
    #[serde(default)]
    pub display_order: i64,
}

impl Member {
    pub fn new(id: impl Into<String>, photo: Option<PhotoSource>, display_order: i64) -> Self {
        Self {
            id: id.into(),
            photo,
            display_order,
        }
    }
}

/// The two stand-in images used for slots without a photo, alternated by slot position.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Placeholders {
    pub even: PhotoSource,
    pub odd: PhotoSource,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            even: PhotoSource::uri("placeholders/placeholder-a.png"),
            odd: PhotoSource::uri("placeholders/placeholder-b.png"),
        }
    }
}

impl Placeholders {
    pub fn for_position(&self, position: usize) -> &PhotoSource {
        if position % 2 == 0 {
            &self.even
        } else {
            &self.odd
        }
    }
}

/// What goes into one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoAssignment {
    /// Position in the `[center, ...border]` slot list.
    pub position: usize,
    pub slot_id: String,
    /// `None` when the slot has no member at all.
    pub member_id: Option<String>,
    pub source: PhotoSource,
    pub is_placeholder: bool,
}

/// One assignment per slot, in slot order.
pub type SlotPhotoMap = Vec<PhotoAssignment>;

/// Center member first, then the rest by `display_order` (ties keep input order).
pub fn order_members<'a>(
    members: &'a [Member],
    center_member_id: Option<&str>,
) -> (Option<&'a Member>, Vec<&'a Member>) {
    let center = center_member_id.and_then(|id| members.iter().find(|m| m.id == id));
    let mut border: Vec<&Member> = members
        .iter()
        .filter(|m| Some(m.id.as_str()) != center.map(|c| c.id.as_str()))
        .collect();
    border.sort_by_key(|m| m.display_order);
    (center, border)
}

/// Map members onto slots: slot 0 takes the center member, slot `i > 0` takes border member
/// `i - 1`. Slots without a photo get the placeholder for their position.
#[tracing::instrument(level = "debug", skip_all, fields(slots = slots.len(), members = members.len()))]
pub fn assign(
    slots: &[Slot],
    members: &[Member],
    center_member_id: Option<&str>,
    placeholders: &Placeholders,
) -> SlotPhotoMap {
    let (center, border) = order_members(members, center_member_id);
    if border.len() + 1 > slots.len() {
        tracing::debug!(
            dropped = border.len() + 1 - slots.len(),
            "more members than slots"
        );
    }

    slots
        .iter()
        .enumerate()
        .map(|(position, slot)| {
            let member = if position == 0 {
                center
            } else {
                border.get(position - 1).copied()
            };
            let photo = member.and_then(|m| m.photo.clone());
            let is_placeholder = photo.is_none();
            PhotoAssignment {
                position,
                slot_id: slot.id.clone(),
                member_id: member.map(|m| m.id.clone()),
                source: photo.unwrap_or_else(|| placeholders.for_position(position).clone()),
                is_placeholder,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/compose/assign.rs"]
mod tests;
