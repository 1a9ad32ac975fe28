//! File-backed storage: one pretty-printed JSON file per key

use super::{validate_key, Storage};
use crate::error::{Result, TierlistError};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Stores `board/abc` as `{root}/board/abc.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at the given data directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        let mut path = self.root.clone();
        let mut segments = key.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.json"));
            }
        }
        Ok(path)
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(key, "no record on disk");
                return Ok(None);
            }
            Err(e) => return Err(TierlistError::storage(key, e.to_string())),
        };
        let value = serde_json::from_str(&content)
            .map_err(|e| TierlistError::storage(key, format!("corrupt record: {e}")))?;
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        let content = serde_json::to_string_pretty(value)?;
        atomic_write(&path, content.as_bytes())
            .map_err(|e| TierlistError::storage(key, e.to_string()))?;
        debug!(key, bytes = content.len(), "record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TierlistError::storage(key, e.to_string())),
        }
    }
}

/// Write to a sibling temp file, then rename over the target
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path)
}
