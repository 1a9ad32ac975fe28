//! Tier list board engine
//!
//! This crate owns the state of a ranked "tier list" board: ordered tier rows
//! holding media items (albums, artists, songs) found through an external
//! catalog.
//!
//! ## Overview
//!
//! - **Pure reducer** - every edit is an [`Action`] folded into an
//!   `Arc<Board>`; no-ops return the same `Arc`
//! - **Linear history** - bounded undo/redo over board snapshots
//! - **Debounced persistence** - boards hydrate from storage and write back
//!   after an idle window, flushing on close
//! - **Shared registry** - the most complete copy of every item seen this
//!   session, progressively enriched with catalog details
//! - **Search controller** - debounced, canonicalized, cached and prefetched
//!   catalog search with retry on 503/504
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tierlist::{Action, BoardSession, FileStorage, ItemRegistry, MediaItem, MediaType, SessionOptions};
//!
//! # async fn example() -> tierlist::Result<()> {
//! let storage = Arc::new(FileStorage::new("/tmp/tierlist"));
//! let mut session =
//!     BoardSession::create("Albums of 1982", storage, ItemRegistry::new(), SessionOptions::default())
//!         .await?;
//!
//! let thriller = MediaItem::new("thriller", MediaType::Album, "Thriller").with_artist("Michael Jackson");
//! session.dispatch(Action::place_item(thriller, "s"));
//! session.undo();
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! ```text
//! {data_dir}/
//! ├── index.json            # Known board ids, most recent first
//! ├── board/{id}.json       # Full board snapshot
//! ├── meta/{id}.json        # Title, counts and timestamps for listings
//! └── search/{context}.json # Per-picker search filters
//! ```

pub mod action;
pub mod catalog;
pub mod config;
mod debounce;
pub mod diff;
mod error;
pub mod history;
pub mod import;
pub mod palette;
pub mod persist;
pub mod reducer;
pub mod registry;
pub mod reorder;
pub mod resolver;
pub mod search;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::Action;
pub use catalog::{Catalog, CatalogError, HttpCatalog, RetryPolicy, SearchPage};
pub use config::TierlistConfig;
pub use debounce::Debouncer;
pub use error::{Result, TierlistError};
pub use history::History;
pub use import::BoardDocument;
pub use palette::Palette;
pub use persist::{BoardIndex, PersistenceSync, SyncPhase};
pub use reducer::BoardReducer;
pub use registry::ItemRegistry;
pub use resolver::Resolver;
pub use search::{SearchController, SearchFilters, SearchOptions, SearchRequest, SearchView};
pub use session::{BoardSession, SessionOptions};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::{
    Board, BoardId, BoardMetadata, ColorId, ItemDetails, ItemId, ItemPatch, MediaItem, MediaType,
    TierDefinition, TierId, TierPatch,
};
