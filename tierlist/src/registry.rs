//! Session-wide registry of the most complete known copy of each item.
//!
//! Boards and search pickers all feed what they learn into one shared
//! [`ItemRegistry`]. Registration is field-level: present fields of the
//! incoming copy win, absent ones never erase what is already known.

use crate::diff;
use crate::types::{ItemId, MediaItem};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// Cheaply cloneable handle; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: Arc<DashMap<ItemId, MediaItem>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `item` into the registry.
    ///
    /// Returns true when the stored copy changed.
    pub fn register(&self, item: &MediaItem) -> bool {
        let mut entry = match self.items.entry(item.id.clone()) {
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(item.clone());
                trace!(item = %item.id, "registered new item");
                return true;
            }
            dashmap::mapref::entry::Entry::Occupied(occupied) => occupied,
        };

        let (current, incoming) = match (
            serde_json::to_value(entry.get()),
            serde_json::to_value(item),
        ) {
            (Ok(current), Ok(incoming)) => (current, incoming),
            _ => return false,
        };
        let merged = diff::merge_present(&current, &incoming);
        if diff::equivalent(&current, &merged) {
            return false;
        }
        match serde_json::from_value::<MediaItem>(merged) {
            Ok(merged) => {
                trace!(item = %item.id, "registry copy updated");
                entry.insert(merged);
                true
            }
            Err(e) => {
                warn!(item = %item.id, error = %e, "merged item is invalid, keeping stored copy");
                false
            }
        }
    }

    /// Register several items, returning how many changed the registry
    pub fn register_all<'a, I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = &'a MediaItem>,
    {
        items.into_iter().filter(|item| self.register(item)).count()
    }

    pub fn get(&self, id: &ItemId) -> Option<MediaItem> {
        self.items.get(id).map(|entry| entry.value().clone())
    }

    /// The registry's version of `item` if it has one, else `item` itself
    pub fn overlay(&self, item: &MediaItem) -> MediaItem {
        self.get(&item.id).unwrap_or_else(|| item.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
