//! Test doubles shared by unit and integration tests.
//!
//! Compiled for this crate's own tests and behind the `test-support`
//! feature for integration tests and downstream crates.

use crate::catalog::{Catalog, CatalogError, SearchPage};
use crate::search::SearchRequest;
use crate::types::{ItemDetails, ItemId, MediaItem, MediaType};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-process catalog with canned answers and call accounting.
///
/// Search results are generated from the request: page `p` of a query `q`
/// holds `results_per_page` albums with ids `q-p{p}-{n}`.
#[derive(Debug)]
pub struct ScriptedCatalog {
    total_pages: u32,
    results_per_page: usize,
    latency: Duration,
    failures: Mutex<VecDeque<u16>>,
    details: Mutex<HashMap<ItemId, ItemDetails>>,
    search_calls: Mutex<Vec<SearchRequest>>,
    detail_calls: AtomicUsize,
    active_details: AtomicUsize,
    max_active_details: AtomicUsize,
}

impl Default for ScriptedCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self {
            total_pages: 1,
            results_per_page: 2,
            latency: Duration::ZERO,
            failures: Mutex::new(VecDeque::new()),
            details: Mutex::new(HashMap::new()),
            search_calls: Mutex::new(Vec::new()),
            detail_calls: AtomicUsize::new(0),
            active_details: AtomicUsize::new(0),
            max_active_details: AtomicUsize::new(0),
        }
    }

    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = total_pages;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer the next search with this HTTP status instead of results
    pub fn fail_next(&self, status: u16) {
        lock(&self.failures).push_back(status);
    }

    pub fn set_details(&self, id: impl Into<ItemId>, details: ItemDetails) {
        lock(&self.details).insert(id.into(), details);
    }

    pub fn search_calls(&self) -> Vec<SearchRequest> {
        lock(&self.search_calls).clone()
    }

    pub fn search_count(&self) -> usize {
        lock(&self.search_calls).len()
    }

    pub fn details_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Highest number of details requests that were running at once
    pub fn max_concurrent_details(&self) -> usize {
        self.max_active_details.load(Ordering::SeqCst)
    }

    /// The page this catalog answers `request` with
    pub fn page_for(&self, request: &SearchRequest) -> SearchPage {
        let query = request.query.as_deref().unwrap_or("all");
        let results = (0..self.results_per_page)
            .map(|n| {
                MediaItem::new(
                    format!("{query}-p{}-{n}", request.page),
                    request.media_type,
                    format!("{query} {n}"),
                )
            })
            .collect();
        SearchPage {
            results,
            page: request.page,
            total_pages: self.total_pages,
        }
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, CatalogError> {
        lock(&self.search_calls).push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failure = lock(&self.failures).pop_front();
        match failure {
            Some(status) => Err(CatalogError::status(status, "scripted failure")),
            None => Ok(self.page_for(request)),
        }
    }

    async fn details(&self, id: &ItemId, _media_type: MediaType) -> Result<ItemDetails, CatalogError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active_details.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_details.fetch_max(active, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.active_details.fetch_sub(1, Ordering::SeqCst);

        let found = lock(&self.details).get(id).cloned();
        found.ok_or_else(|| CatalogError::status(404, format!("no details for {id}")))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
