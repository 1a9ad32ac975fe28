//! Durable key/value storage for serialized records.
//!
//! Keys are `/`-separated relative names such as `board/{id}`, `meta/{id}`,
//! `index` or `search/{context}`. Values are JSON documents. The trait is
//! synchronous so a pending write can still be flushed from `Drop`.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::{Result, TierlistError};
use serde_json::Value;

/// A store of JSON records addressed by key
pub trait Storage: Send + Sync {
    /// Read a record; `Ok(None)` when it does not exist
    fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Create or replace a record
    fn write(&self, key: &str, value: &Value) -> Result<()>;

    /// Delete a record; deleting a missing record is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Key of a board's full snapshot
pub fn board_key(id: &str) -> String {
    format!("board/{id}")
}

/// Key of a board's metadata record
pub fn meta_key(id: &str) -> String {
    format!("meta/{id}")
}

/// Key of the board index record
pub const INDEX_KEY: &str = "index";

/// Key of a search context's persisted filters
pub fn search_key(context: &str) -> String {
    format!("search/{context}")
}

/// Reject keys that could escape the storage root or are otherwise unusable
/// as file names.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });
    if valid {
        Ok(())
    } else {
        Err(TierlistError::storage(key, "invalid storage key"))
    }
}
