//! Catalog search with debounced filters, canonical caching and prefetch.
//!
//! The controller keeps two copies of the filters: the draft the user is
//! editing, and the committed filters the current request was built from.
//! Text and year fields reach the committed copy only after the debounce
//! window (or [`SearchController::search_now`]); facet, mode, media type and
//! page changes commit immediately. Responses whose request is no longer
//! current are cached but never published.

mod cache;
mod request;

pub use cache::{PageCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use request::{FacetMatch, MatchMode, SearchFilters, SearchRequest};

use crate::catalog::{Catalog, CatalogError, RetryPolicy, SearchPage};
use crate::debounce::Debouncer;
use crate::persist::{PersistenceSync, DEFAULT_PERSIST_DEBOUNCE};
use crate::registry::ItemRegistry;
use crate::storage::{search_key, Storage};
use crate::types::{MediaItem, MediaType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Timing and sizing knobs for a controller
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub retry: RetryPolicy,
    pub persist_debounce: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_SEARCH_DEBOUNCE,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            retry: RetryPolicy::default(),
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
        }
    }
}

/// Persisted per-context search state: the active media type and the draft
/// filters of every media type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSession {
    pub media_type: MediaType,
    pub filters: BTreeMap<MediaType, SearchFilters>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self {
            media_type: MediaType::Album,
            filters: BTreeMap::new(),
        }
    }
}

impl SearchSession {
    fn current(&self) -> SearchFilters {
        self.filters.get(&self.media_type).cloned().unwrap_or_default()
    }

    fn current_mut(&mut self) -> &mut SearchFilters {
        self.filters.entry(self.media_type).or_default()
    }
}

/// A surfaced, dismissible search failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    pub status: Option<u16>,
    pub message: String,
}

impl From<&CatalogError> for SearchError {
    fn from(e: &CatalogError) -> Self {
        Self {
            status: e.status_code(),
            message: e.to_string(),
        }
    }
}

/// What observers see
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    pub key: String,
    pub media_type: MediaType,
    pub results: Vec<MediaItem>,
    pub page: u32,
    pub total_pages: u32,
    pub loading: bool,
    pub error: Option<SearchError>,
}

impl SearchView {
    fn idle(request: &SearchRequest) -> Self {
        Self {
            key: request.key(),
            media_type: request.media_type,
            results: Vec::new(),
            page: request.page,
            total_pages: 0,
            loading: false,
            error: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

struct ControllerState {
    draft: SearchSession,
    committed: SearchFilters,
    request: SearchRequest,
    cache: PageCache,
}

struct Inner {
    catalog: Arc<dyn Catalog>,
    registry: ItemRegistry,
    retry: RetryPolicy,
    state: Mutex<ControllerState>,
    view: watch::Sender<SearchView>,
    debouncer: Debouncer,
    persistence: PersistenceSync<SearchSession>,
}

/// Search state for one picker context
pub struct SearchController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("key", &self.view().key)
            .finish_non_exhaustive()
    }
}

impl SearchController {
    /// Restore the search session stored under `context` and load its
    /// results if it has anything to search for
    pub async fn open(
        context: &str,
        storage: Arc<dyn Storage>,
        catalog: Arc<dyn Catalog>,
        registry: ItemRegistry,
        options: SearchOptions,
    ) -> Self {
        let persistence =
            PersistenceSync::new(search_key(context), storage, options.persist_debounce);
        let draft = persistence.hydrate(SearchSession::default()).await;
        let committed = draft.current();
        let request = SearchRequest::new(draft.media_type, &committed);
        let (view, _) = watch::channel(SearchView::idle(&request));

        let inner = Arc::new(Inner {
            catalog,
            registry,
            retry: options.retry,
            state: Mutex::new(ControllerState {
                draft,
                committed,
                request: request.clone(),
                cache: PageCache::new(options.cache_capacity, options.cache_ttl),
            }),
            view,
            debouncer: Debouncer::new(options.debounce),
            persistence,
        });
        debug!(context, key = %request.key(), "search session opened");
        inner.load(request);
        Self { inner }
    }

    pub fn view(&self) -> SearchView {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.view.subscribe()
    }

    /// Wait until no fetch for the current request is outstanding
    pub async fn settled(&self) -> SearchView {
        let mut rx = self.subscribe();
        let view = match rx.wait_for(|view| !view.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        };
        view
    }

    pub fn media_type(&self) -> MediaType {
        self.inner.lock_state().draft.media_type
    }

    /// Filters as currently edited, including changes still in the
    /// debounce window
    pub fn filters(&self) -> SearchFilters {
        self.inner.lock_state().draft.current()
    }

    /// The request the current results belong to
    pub fn request(&self) -> SearchRequest {
        self.inner.lock_state().request.clone()
    }

    /// Switch media type; that type's own filters become current at once
    pub fn set_media_type(&self, media_type: MediaType) {
        self.inner.debouncer.cancel();
        self.inner.commit(|state| {
            state.draft.media_type = media_type;
            state.committed = state.draft.current();
        });
    }

    pub fn set_query(&self, query: &str) {
        self.inner.commit(|state| state.draft.current_mut().query = query.to_string());
        self.schedule_commit();
    }

    pub fn set_year_range(&self, from: Option<i32>, to: Option<i32>) {
        self.inner.commit(|state| {
            let filters = state.draft.current_mut();
            filters.year_from = from;
            filters.year_to = to;
        });
        self.schedule_commit();
    }

    pub fn toggle_facet(&self, facet: &str, value: &str) {
        self.inner.commit(|state| {
            state.draft.current_mut().toggle_facet(facet, value);
            state.committed.facets = state.draft.current().facets;
        });
    }

    pub fn set_facet(&self, facet: &str, values: &[&str]) {
        self.inner.commit(|state| {
            state
                .draft
                .current_mut()
                .set_facet(facet, values.iter().copied());
            state.committed.facets = state.draft.current().facets;
        });
    }

    pub fn set_match_mode(&self, mode: MatchMode) {
        self.inner.commit(|state| {
            state.draft.current_mut().match_mode = mode;
            state.committed.match_mode = mode;
        });
    }

    pub fn set_facet_match(&self, mode: FacetMatch) {
        self.inner.commit(|state| {
            state.draft.current_mut().facet_match = mode;
            state.committed.facet_match = mode;
        });
    }

    /// Jump to a 1-indexed page of the current search
    pub fn set_page(&self, page: u32) {
        let request = {
            let mut state = self.inner.lock_state();
            let request = state.request.with_page(page);
            if request == state.request {
                return;
            }
            state.request = request.clone();
            request
        };
        self.inner.load(request);
    }

    pub fn next_page(&self) {
        let view = self.view();
        if view.has_more() {
            self.set_page(view.page + 1);
        }
    }

    /// Commit every pending edit now and search.
    ///
    /// With nothing to commit, the current page is fetched again when it
    /// failed or is no longer cached.
    pub fn search_now(&self) {
        self.inner.debouncer.cancel();
        if !self.inner.commit(|state| state.committed = state.draft.current()) {
            self.inner.refresh();
        }
    }

    pub fn dismiss_error(&self) {
        self.inner.view.send_modify(|view| view.error = None);
    }

    /// Persist the search session immediately
    pub fn flush(&self) -> crate::Result<bool> {
        self.inner.persistence.flush()
    }

    fn schedule_commit(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                inner.commit(|state| {
                    let draft = state.draft.current();
                    state.committed.query = draft.query;
                    state.committed.year_from = draft.year_from;
                    state.committed.year_to = draft.year_to;
                });
            }
        });
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `apply`, persist the draft, and load the resulting request if
    /// its key changed. Returns whether a load started.
    fn commit(self: &Arc<Self>, apply: impl FnOnce(&mut ControllerState)) -> bool {
        let request = {
            let mut state = self.lock_state();
            apply(&mut state);
            self.persistence.schedule(&state.draft);

            let request = SearchRequest::new(state.draft.media_type, &state.committed);
            if request.key() == state.request.key() {
                trace!(key = %request.key(), "request unchanged");
                return false;
            }
            state.request = request.clone();
            request
        };
        self.load(request);
        true
    }

    /// Load the current request again unless a fetch is running or its page
    /// is freshly cached without an error showing
    fn refresh(self: &Arc<Self>) {
        let (loading, failed) = {
            let view = self.view.borrow();
            (view.loading, view.error.is_some())
        };
        if loading {
            return;
        }
        let request = {
            let mut state = self.lock_state();
            let (key, page) = (state.request.key(), state.request.page);
            let fresh = state.cache.contains_fresh(&key, page);
            if fresh && !failed {
                return;
            }
            state.request.clone()
        };
        debug!(key = %request.key(), page = request.page, "searching again");
        self.load(request);
    }

    /// Serve `request` from cache or start a fetch for it
    fn load(self: &Arc<Self>, request: SearchRequest) {
        if request.is_empty() {
            self.view.send_replace(SearchView::idle(&request));
            return;
        }

        let cached = self.lock_state().cache.get(&request.key(), request.page);
        match cached {
            Some(page) => {
                trace!(key = %request.key(), page = request.page, "cache hit");
                self.publish(&request, &page);
                if page.has_more() {
                    self.prefetch(request.with_page(page.page + 1));
                }
            }
            None => {
                self.view.send_modify(|view| {
                    view.key = request.key();
                    view.media_type = request.media_type;
                    view.page = request.page;
                    view.loading = true;
                    view.error = None;
                });
                self.spawn_fetch(request);
            }
        }
    }

    fn spawn_fetch(self: &Arc<Self>, request: SearchRequest) {
        let weak = Arc::downgrade(self);
        let catalog = Arc::clone(&self.catalog);
        let retry = self.retry.clone();
        debug!(key = %request.key(), page = request.page, "fetching search page");
        tokio::spawn(async move {
            let result = retry.run("search", || catalog.search(&request)).await;
            if let Some(inner) = weak.upgrade() {
                inner.finish_fetch(request, result);
            }
        });
    }

    fn finish_fetch(self: &Arc<Self>, request: SearchRequest, result: Result<SearchPage, CatalogError>) {
        let key = request.key();
        let next = {
            let mut state = self.lock_state();
            let current = state.request == request;
            match result {
                Ok(page) => {
                    self.registry.register_all(&page.results);
                    state.cache.insert(&key, request.page, page.clone());
                    if !current {
                        debug!(key = %key, page = request.page, "discarding stale response");
                        return;
                    }
                    drop(state);
                    self.publish(&request, &page);
                    page.has_more().then(|| request.with_page(page.page + 1))
                }
                Err(e) => {
                    if !current {
                        debug!(key = %key, error = %e, "discarding stale failure");
                        return;
                    }
                    warn!(key = %key, error = %e, "search failed");
                    drop(state);
                    self.view.send_modify(|view| {
                        view.loading = false;
                        view.error = Some(SearchError::from(&e));
                    });
                    None
                }
            }
        };
        if let Some(next) = next {
            self.prefetch(next);
        }
    }

    /// Fetch `request` into the cache without publishing it
    fn prefetch(self: &Arc<Self>, request: SearchRequest) {
        if self.lock_state().cache.contains_fresh(&request.key(), request.page) {
            return;
        }
        let weak = Arc::downgrade(self);
        let catalog = Arc::clone(&self.catalog);
        trace!(key = %request.key(), page = request.page, "prefetching");
        tokio::spawn(async move {
            let result = catalog.search(&request).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match result {
                Ok(page) => {
                    let mut state = inner.lock_state();
                    if state.request.key() != request.key() {
                        trace!(key = %request.key(), "prefetch superseded");
                        return;
                    }
                    inner.registry.register_all(&page.results);
                    state.cache.insert(&request.key(), request.page, page);
                }
                Err(e) => debug!(key = %request.key(), error = %e, "prefetch failed"),
            }
        });
    }

    fn publish(&self, request: &SearchRequest, page: &SearchPage) {
        let results = page
            .results
            .iter()
            .map(|item| self.registry.overlay(item))
            .collect();
        self.view.send_replace(SearchView {
            key: request.key(),
            media_type: request.media_type,
            results,
            page: page.page,
            total_pages: page.total_pages,
            loading: false,
            error: None,
        });
    }
}
