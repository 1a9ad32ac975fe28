//! Error types for the board engine.
//!
//! The reducer cannot fail; everything here comes from the async boundary
//! (storage, network, configuration) or from validating untrusted input.

use crate::catalog::CatalogError;
use thiserror::Error;

/// Result type for board engine operations
pub type Result<T> = std::result::Result<T, TierlistError>;

/// Errors that can occur outside the pure reducer
#[derive(Debug, Error)]
pub enum TierlistError {
    /// Board not present in storage
    #[error("board not found: {id}")]
    BoardNotFound { id: String },

    /// Storage backend failure for a given record
    #[error("storage error for '{key}': {message}")]
    Storage { key: String, message: String },

    /// Import document does not match the expected structure
    #[error("invalid import: {message}")]
    InvalidImport { message: String },

    /// Import document version is not understood
    #[error("unsupported document version {found}")]
    UnsupportedVersion { found: u32 },

    /// Catalog request failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TierlistError {
    /// Create a storage error
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an import validation error
    pub fn invalid_import(message: impl Into<String>) -> Self {
        Self::InvalidImport {
            message: message.into(),
        }
    }

    /// Check if retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Catalog(e) => e.is_retryable(),
            Self::Storage { .. } | Self::Io(_) => true,
            _ => false,
        }
    }
}

impl From<figment::Error> for TierlistError {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TierlistError::BoardNotFound { id: "abc".into() };
        assert_eq!(err.to_string(), "board not found: abc");
    }

    #[test]
    fn test_invalid_import() {
        let err = TierlistError::invalid_import("missing tiers");
        assert!(err.to_string().contains("missing tiers"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        let unavailable = TierlistError::Catalog(CatalogError::Status {
            status: 503,
            message: "busy".into(),
        });
        assert!(unavailable.is_retryable());
        assert!(TierlistError::storage("board/x", "disk full").is_retryable());
        assert!(!TierlistError::UnsupportedVersion { found: 9 }.is_retryable());
    }
}
