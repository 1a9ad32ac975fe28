//! The closed set of board actions.
//!
//! Every user gesture (drag, rename, delete, ...) becomes one of these values
//! and is fed through [`crate::reducer::BoardReducer`].

use crate::types::{Board, ItemId, ItemPatch, MediaItem, TierId, TierPatch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Append a new tier; label defaults to the placeholder
    AddTier {
        #[serde(default)]
        label: Option<String>,
    },
    /// Delete a tier, moving its items to the first remaining tier
    DeleteTier { tier_id: TierId },
    /// Partial update of a tier's label/color
    UpdateTier { tier_id: TierId, patch: TierPatch },
    /// Move a tier from one index to another
    ReorderTiers { old_index: usize, new_index: usize },
    /// Drag an item (or a new search result) onto a tier or another item
    MoveItem {
        active_id: ItemId,
        over_id: String,
        #[serde(default)]
        source_tier: Option<TierId>,
        #[serde(default)]
        new_item: Option<MediaItem>,
    },
    /// Partial update of an item wherever it sits
    UpdateItem { item_id: ItemId, patch: ItemPatch },
    /// Remove an item from a tier
    RemoveItem { tier_id: TierId, item_id: ItemId },
    UpdateTitle { title: String },
    RandomizeColors,
    /// Remove every item, keeping tiers and title
    ClearBoard,
    /// Swap in an entirely new board (import, hydration)
    ReplaceState {
        #[serde(with = "arc_board")]
        board: Arc<Board>,
    },
}

impl Action {
    pub fn add_tier() -> Self {
        Self::AddTier { label: None }
    }

    pub fn delete_tier(tier_id: impl Into<TierId>) -> Self {
        Self::DeleteTier {
            tier_id: tier_id.into(),
        }
    }

    pub fn update_tier(tier_id: impl Into<TierId>, patch: TierPatch) -> Self {
        Self::UpdateTier {
            tier_id: tier_id.into(),
            patch,
        }
    }

    /// Move an item already on the board
    pub fn move_item(active_id: impl Into<ItemId>, over_id: impl Into<String>) -> Self {
        Self::MoveItem {
            active_id: active_id.into(),
            over_id: over_id.into(),
            source_tier: None,
            new_item: None,
        }
    }

    /// Drop a new item (typically a search result) onto the board
    pub fn place_item(item: MediaItem, over_id: impl Into<String>) -> Self {
        Self::MoveItem {
            active_id: item.id.clone(),
            over_id: over_id.into(),
            source_tier: None,
            new_item: Some(item),
        }
    }

    pub fn update_item(item_id: impl Into<ItemId>, patch: ItemPatch) -> Self {
        Self::UpdateItem {
            item_id: item_id.into(),
            patch,
        }
    }

    pub fn remove_item(tier_id: impl Into<TierId>, item_id: impl Into<ItemId>) -> Self {
        Self::RemoveItem {
            tier_id: tier_id.into(),
            item_id: item_id.into(),
        }
    }

    pub fn update_title(title: impl Into<String>) -> Self {
        Self::UpdateTitle {
            title: title.into(),
        }
    }

    pub fn replace_state(board: impl Into<Arc<Board>>) -> Self {
        Self::ReplaceState {
            board: board.into(),
        }
    }

    /// Short verb used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTier { .. } => "add_tier",
            Self::DeleteTier { .. } => "delete_tier",
            Self::UpdateTier { .. } => "update_tier",
            Self::ReorderTiers { .. } => "reorder_tiers",
            Self::MoveItem { .. } => "move_item",
            Self::UpdateItem { .. } => "update_item",
            Self::RemoveItem { .. } => "remove_item",
            Self::UpdateTitle { .. } => "update_title",
            Self::RandomizeColors => "randomize_colors",
            Self::ClearBoard => "clear_board",
            Self::ReplaceState { .. } => "replace_state",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod arc_board {
    use crate::types::Board;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(board: &Arc<Board>, serializer: S) -> Result<S::Ok, S::Error> {
        board.as_ref().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<Board>, D::Error> {
        Board::deserialize(deserializer).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;

    #[test]
    fn test_action_serialization_is_tagged() {
        let action = Action::move_item("x", "s");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "move_item");
        assert_eq!(json["over_id"], "s");

        let parsed: Action = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, action);
    }

    #[test]
    fn test_place_item_uses_payload_id() {
        let item = MediaItem::new("r1", MediaType::Song, "River");
        match Action::place_item(item, "b") {
            Action::MoveItem {
                active_id,
                new_item,
                ..
            } => {
                assert_eq!(active_id.as_str(), "r1");
                assert!(new_item.is_some());
            }
            other => panic!("unexpected action {other}"),
        }
    }
}
