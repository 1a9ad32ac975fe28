//! Multi-board index: the `index` record plus per-board `meta/{id}` records

use crate::error::{Result, TierlistError};
use crate::storage::{board_key, meta_key, Storage, INDEX_KEY};
use crate::types::{BoardId, BoardMetadata};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lists and maintains saved boards without loading their snapshots
#[derive(Clone)]
pub struct BoardIndex {
    storage: Arc<dyn Storage>,
}

impl BoardIndex {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Known board ids, most recently registered first
    pub fn ids(&self) -> Result<Vec<BoardId>> {
        match self.storage.read(INDEX_KEY)? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                TierlistError::storage(INDEX_KEY, format!("corrupt index: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    pub fn contains(&self, id: &BoardId) -> Result<bool> {
        Ok(self.ids()?.contains(id))
    }

    /// Metadata for one board
    pub fn get(&self, id: &BoardId) -> Result<Option<BoardMetadata>> {
        match self.storage.read(&meta_key(id.as_str()))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Metadata for every indexed board. Entries whose metadata is missing or
    /// unreadable are skipped.
    pub fn list(&self) -> Result<Vec<BoardMetadata>> {
        let mut boards = Vec::new();
        for id in self.ids()? {
            match self.get(&id) {
                Ok(Some(meta)) => boards.push(meta),
                Ok(None) => warn!(board = %id, "indexed board has no metadata"),
                Err(e) => warn!(board = %id, error = %e, "skipping unreadable metadata"),
            }
        }
        Ok(boards)
    }

    /// Store `meta` and move its board to the front of the index
    pub fn register(&self, meta: &BoardMetadata) -> Result<()> {
        self.storage
            .write(&meta_key(meta.id.as_str()), &serde_json::to_value(meta)?)?;

        let mut ids = self.ids()?;
        ids.retain(|id| id != &meta.id);
        ids.insert(0, meta.id.clone());
        self.write_ids(&ids)?;
        debug!(board = %meta.id, "board registered");
        Ok(())
    }

    /// Delete a board's snapshot, metadata and index entry.
    ///
    /// Returns false when the board was not indexed.
    pub fn remove(&self, id: &BoardId) -> Result<bool> {
        let mut ids = self.ids()?;
        let before = ids.len();
        ids.retain(|known| known != id);
        let removed = ids.len() != before;

        self.storage.remove(&board_key(id.as_str()))?;
        self.storage.remove(&meta_key(id.as_str()))?;
        if removed {
            self.write_ids(&ids)?;
            debug!(board = %id, "board removed");
        }
        Ok(removed)
    }

    fn write_ids(&self, ids: &[BoardId]) -> Result<()> {
        self.storage.write(INDEX_KEY, &serde_json::to_value(ids)?)
    }
}

impl std::fmt::Debug for BoardIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardIndex").finish_non_exhaustive()
    }
}
