//! Infinite-scroll product feed
//!
//! Unlike the paginated controller, the feed has no draft/applied split:
//! filter changes take effect immediately, clear the accumulated items and
//! restart from page 1. Each successful page is appended to the items.
//!
//! Whether more pages exist is inferred from the last page being full
//! ([`has_more`]). When the total is an exact multiple of the page size this
//! costs one extra fetch that comes back empty.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::Result;
use crate::filter::{FilterPatch, FilterState};
use crate::pagination::{PaginationMeta, has_more, normalize};
use crate::search::ProductSearch;
use crate::types::Product;

use super::ControllerOptions;
use super::runtime::{FetchOutcome, FetchRequest, Model, Runtime};

#[derive(Debug, Clone)]
pub struct FeedState {
    /// Items from every page loaded so far, in page order
    pub items: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    /// Filters in effect (the page field is managed by the feed)
    pub filters: FilterState,
    /// Number of pages appended so far
    pub loaded_pages: u32,
    pub has_more: bool,
    /// Metadata reported with the last appended page
    pub pagination: PaginationMeta,
    /// Search text of the request that started the current feed
    pub fetched_search: String,
    pub generation: u64,
}

impl FeedState {
    pub fn new(mut filters: FilterState) -> Self {
        filters.page = 1;
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            pagination: PaginationMeta::empty(1, filters.limit),
            filters,
            loaded_pages: 0,
            has_more: false,
            fetched_search: String::new(),
            generation: 0,
        }
    }

    fn request_page(&mut self, page: u32) -> FetchRequest {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        let mut filters = self.filters.clone();
        filters.set_page(page);
        FetchRequest {
            generation: self.generation,
            filters,
        }
    }

    fn restart(&mut self) -> FetchRequest {
        self.items.clear();
        self.loaded_pages = 0;
        self.has_more = false;
        self.filters.page = 1;
        self.pagination = PaginationMeta::empty(1, self.filters.limit);
        self.fetched_search = self.filters.search.clone();
        self.request_page(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub filters: FilterState,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone)]
pub enum FeedAction {
    /// Change filters and restart the feed
    SetFilters(FilterPatch),
    /// Echo search input; the feed restarts when typing settles
    SetSearchText(String),
    SearchSettled(String),
    /// Request the page after the last loaded one
    LoadMore,
    /// Drop everything and reload from page 1
    Refresh,
    FetchCompleted {
        request: FetchRequest,
        outcome: FetchOutcome,
    },
}

/// Apply `action` to the feed, returning the fetch to issue, if any
pub fn reduce_feed_state(state: &mut FeedState, action: FeedAction) -> Option<FetchRequest> {
    match action {
        FeedAction::SetFilters(patch) => {
            patch.apply_to(&mut state.filters);
            state.filters.clamp_price_range();
            if let Some(text) = &patch.search {
                state.filters.search = text.clone();
            }
            // Search-only patches wait for the debouncer
            if !patch.has_filter_changes() {
                return None;
            }
            Some(state.restart())
        }
        FeedAction::SetSearchText(text) => {
            state.filters.search = text;
            None
        }
        FeedAction::SearchSettled(text) => {
            // Superseded by later typing, or already the text in effect
            if text != state.filters.search || text == state.fetched_search {
                return None;
            }
            Some(state.restart())
        }
        FeedAction::LoadMore => {
            if state.loading || !state.has_more {
                return None;
            }
            let next = state.loaded_pages + 1;
            Some(state.request_page(next))
        }
        FeedAction::Refresh => Some(state.restart()),
        FeedAction::FetchCompleted { request, outcome } => {
            if request.generation != state.generation {
                tracing::debug!(
                    stale = request.generation,
                    current = state.generation,
                    "discarding stale feed response"
                );
                return None;
            }
            state.loading = false;
            match outcome {
                FetchOutcome::Success(page) => {
                    let returned = page.items.len();
                    state.pagination =
                        normalize(&page.raw_meta, request.filters.page, request.filters.limit);
                    state.items.extend(page.items);
                    state.loaded_pages = request.filters.page;
                    state.filters.page = request.filters.page;
                    state.has_more = has_more(returned, request.filters.limit);
                }
                FetchOutcome::Failure(message) => {
                    // Already loaded pages stay visible; LoadMore retries the same page
                    state.error = Some(message);
                    state.has_more = true;
                }
            }
            None
        }
    }
}

impl Model for FeedState {
    type Action = FeedAction;
    type Snapshot = FeedSnapshot;

    fn start(&mut self) -> Option<FetchRequest> {
        Some(self.restart())
    }

    fn reduce(&mut self, action: FeedAction) -> Option<FetchRequest> {
        reduce_feed_state(self, action)
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            loading: self.loading,
            error: self.error.clone(),
            has_more: self.has_more,
            filters: self.filters.clone(),
            pagination: self.pagination,
        }
    }

    fn debounced_text(action: &FeedAction) -> Option<String> {
        match action {
            FeedAction::SetSearchText(text) => Some(text.clone()),
            FeedAction::SetFilters(patch) => patch.search.clone(),
            _ => None,
        }
    }

    fn search_settled(text: String) -> FeedAction {
        FeedAction::SearchSettled(text)
    }

    fn fetch_completed(request: FetchRequest, outcome: FetchOutcome) -> FeedAction {
        FeedAction::FetchCompleted { request, outcome }
    }
}

/// Infinite-scroll listing that appends pages as the user scrolls
pub struct FeedController {
    runtime: Runtime<FeedState>,
}

impl FeedController {
    /// Start the feed and request its first page.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(search: Arc<S>, options: ControllerOptions) -> Self
    where
        S: ProductSearch + ?Sized + 'static,
    {
        let mut filters = options.initial;
        filters.clamp_price_range();
        Self {
            runtime: Runtime::spawn(FeedState::new(filters), search, options.search_debounce),
        }
    }

    /// Change filters; the feed restarts from page 1 right away
    pub async fn set_filters(&self, patch: FilterPatch) -> Result<FeedSnapshot> {
        self.runtime.dispatch(FeedAction::SetFilters(patch)).await
    }

    pub async fn set_search_text(&self, text: impl Into<String>) -> Result<FeedSnapshot> {
        self.runtime
            .dispatch(FeedAction::SetSearchText(text.into()))
            .await
    }

    /// Append the next page if one is expected and nothing is loading
    pub async fn load_more(&self) -> Result<FeedSnapshot> {
        self.runtime.dispatch(FeedAction::LoadMore).await
    }

    pub async fn refresh(&self) -> Result<FeedSnapshot> {
        self.runtime.dispatch(FeedAction::Refresh).await
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.runtime.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.runtime.subscribe()
    }

    pub async fn wait_idle(&self) -> Result<FeedSnapshot> {
        self.runtime.wait_for(|s| !s.loading).await
    }

    pub async fn shutdown(self) {
        self.runtime.shutdown().await;
    }
}
