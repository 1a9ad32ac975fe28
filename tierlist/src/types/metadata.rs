//! Lightweight per-board metadata used by the multi-board index

use super::board::Board;
use super::ids::BoardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of a saved board, readable without loading the full snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMetadata {
    pub id: BoardId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub item_count: usize,
}

impl BoardMetadata {
    /// Metadata for a board seen for the first time
    pub fn new(id: BoardId, board: &Board) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: board.title.clone(),
            category: board.category.clone(),
            created_at: now,
            last_modified_at: now,
            item_count: board.item_count(),
        }
    }

    /// Refresh the summary after the board changed
    pub fn touch(&mut self, board: &Board) {
        self.title = board.title.clone();
        self.category = board.category.clone();
        self.item_count = board.item_count();
        self.last_modified_at = Utc::now();
    }
}
