//! Progressive enrichment of board items with deep details.
//!
//! The registry copy wins when it already has details. Otherwise the
//! resolver asks the catalog, with concurrent requests for the same id
//! collapsed into one in-flight fetch. Failures are logged and simply leave
//! the item unenriched until the next scan.

use crate::catalog::Catalog;
use crate::registry::ItemRegistry;
use crate::types::{ItemDetails, ItemId, MediaItem};
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// How many detail fetches a background scan runs at once
pub const ENRICHMENT_CONCURRENCY: usize = 3;

type InflightFetch = Shared<BoxFuture<'static, Option<ItemDetails>>>;

#[derive(Clone)]
pub struct Resolver {
    registry: ItemRegistry,
    catalog: Option<Arc<dyn Catalog>>,
    inflight: Arc<Mutex<HashMap<ItemId, InflightFetch>>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("fetching", &self.catalog.is_some())
            .field("registry_len", &self.registry.len())
            .finish()
    }
}

impl Resolver {
    /// Resolver that may fetch from `catalog`
    pub fn new(registry: ItemRegistry, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            registry,
            catalog: Some(catalog),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolver that only consults the registry
    pub fn offline(registry: ItemRegistry) -> Self {
        Self {
            registry,
            catalog: None,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    /// Enriched copy of `item`, or `None` when there is nothing new to report
    pub async fn resolve(&self, item: &MediaItem) -> Option<MediaItem> {
        if item.is_enriched() {
            return None;
        }

        let known = self.registry.overlay(item);
        if known.is_enriched() {
            debug!(item = %item.id, "enriched from registry");
            return Some(known);
        }

        let details = self.fetch_details(item).await?;
        self.registry.register(&item.clone().with_details(details));
        let enriched = self.registry.overlay(item);
        enriched.is_enriched().then_some(enriched)
    }

    /// Resolve every unenriched item, at most [`ENRICHMENT_CONCURRENCY`] at a
    /// time. Returns the items that gained details.
    pub async fn enrich_missing<I>(&self, items: I) -> Vec<MediaItem>
    where
        I: IntoIterator<Item = MediaItem>,
    {
        let pending: Vec<MediaItem> = items.into_iter().filter(|i| !i.is_enriched()).collect();
        if pending.is_empty() {
            return Vec::new();
        }
        debug!(count = pending.len(), "enriching items");

        let enriched: Vec<MediaItem> = stream::iter(pending)
            .map(|item| async move { self.resolve(&item).await })
            .buffer_unordered(ENRICHMENT_CONCURRENCY)
            .filter_map(|resolved| async move { resolved })
            .collect()
            .await;
        debug!(count = enriched.len(), "enrichment pass finished");
        enriched
    }

    /// Number of detail fetches currently running
    pub fn inflight_count(&self) -> usize {
        self.lock_inflight().len()
    }

    async fn fetch_details(&self, item: &MediaItem) -> Option<ItemDetails> {
        let catalog = self.catalog.as_ref()?;
        let fetch = {
            let mut inflight = self.lock_inflight();
            match inflight.get(&item.id) {
                Some(existing) => existing.clone(),
                None => {
                    let fetch = Self::start_fetch(
                        Arc::clone(catalog),
                        Arc::clone(&self.inflight),
                        item,
                    );
                    inflight.insert(item.id.clone(), fetch.clone());
                    fetch
                }
            }
        };
        fetch.await
    }

    fn start_fetch(
        catalog: Arc<dyn Catalog>,
        inflight: Arc<Mutex<HashMap<ItemId, InflightFetch>>>,
        item: &MediaItem,
    ) -> InflightFetch {
        let id = item.id.clone();
        let media_type = item.media_type;
        async move {
            let result = catalog.details(&id, media_type).await;
            inflight
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
            match result {
                Ok(details) => Some(details),
                Err(e) => {
                    warn!(item = %id, error = %e, "details fetch failed");
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    fn lock_inflight(&self) -> MutexGuard<'_, HashMap<ItemId, InflightFetch>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }
}
