//! Core types for the board engine

mod board;
mod ids;
mod item;
mod metadata;

// Re-export all types
pub use board::{Board, TierDefinition, TierPatch, DEFAULT_TITLE, NEW_TIER_LABEL};
pub use ids::{BoardId, ColorId, ItemId, TierId};
pub use item::{ItemDetails, ItemPatch, MediaItem, MediaType};
pub use metadata::BoardMetadata;
