//! Client side of the read-only catalog service.
//!
//! The engine only needs two idempotent reads: a paged search and a deep
//! details lookup for one `(id, type)` pair.

mod error;
mod http;
mod retry;

pub use error::CatalogError;
pub use http::HttpCatalog;
pub use retry::RetryPolicy;

use crate::search::SearchRequest;
use crate::types::{ItemDetails, ItemId, MediaItem, MediaType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<MediaItem>,
    pub page: u32,
    pub total_pages: u32,
}

impl SearchPage {
    /// Whether a later page exists
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Read access to the external catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, CatalogError>;

    async fn details(&self, id: &ItemId, media_type: MediaType) -> Result<ItemDetails, CatalogError>;
}
