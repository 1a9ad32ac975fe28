//! Newtype identifiers.
//!
//! Tier and board ids are opaque strings. Freshly created ones are ULIDs, but
//! imported or hand-written ids (`"s"`, `"unranked"`) are accepted as-is.
//! Item ids are the catalog's stable keys and are never generated locally.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use ulid::Ulid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing id string
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Stable identifier of a tier row
    TierId
);

string_id!(
    /// Identifier of a saved board
    BoardId
);

string_id!(
    /// Catalog key of a media item
    ItemId
);

string_id!(
    /// Palette color identifier (the theme table maps it to real colors)
    ColorId
);

impl TierId {
    /// Generate a fresh ULID-based tier id
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl Default for TierId {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardId {
    /// Generate a fresh ULID-based board id
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }
}

impl Default for BoardId {
    fn default() -> Self {
        Self::new()
    }
}
