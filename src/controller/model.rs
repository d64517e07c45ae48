//! Filtered pagination state machine
//!
//! This module holds the pure state transitions of the paginated product
//! listing, separate from the task that drives them, so the whole draft /
//! applied / fetch lifecycle can be unit tested without timers or a runtime.

use serde::Serialize;

use crate::filter::{FilterPatch, FilterState};
use crate::pagination::{PaginationMeta, normalize};
use crate::types::Product;

use super::runtime::{FetchOutcome, FetchRequest, Model};

// ============================================================================
// State Types
// ============================================================================

/// Full controller state, including bookkeeping hidden from the UI
#[derive(Debug, Clone)]
pub struct ControllerState {
    /// Items of the current page
    pub items: Vec<Product>,
    /// Whether the latest fetch is still outstanding
    pub loading: bool,
    /// Message of the last failed fetch
    pub error: Option<String>,
    pub pagination: PaginationMeta,
    /// Filters as edited in the UI
    pub draft: FilterState,
    /// Filters used for the last/next fetch
    pub applied: FilterState,
    /// Generation of the most recently issued fetch
    pub generation: u64,
}

impl ControllerState {
    pub fn new(initial: FilterState) -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            pagination: PaginationMeta::empty(initial.page, initial.limit),
            draft: initial.clone(),
            applied: initial,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            items: self.items.clone(),
            loading: self.loading,
            error: self.error.clone(),
            pagination: self.pagination,
            draft: self.draft.clone(),
            applied: self.applied.clone(),
        }
    }

    fn begin_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        FetchRequest {
            generation: self.generation,
            filters: self.applied.clone(),
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(FilterState::default())
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub items: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: PaginationMeta,
    pub draft: FilterState,
    pub applied: FilterState,
}

// ============================================================================
// Action Types
// ============================================================================

#[derive(Debug, Clone)]
pub enum ControllerAction {
    /// Merge a partial update into the draft. A `search` field is echoed to
    /// the draft and handed to the debouncer like `SetSearchText`.
    SetDraft(FilterPatch),
    /// Promote the draft filters to applied and go back to page 1
    ApplyFilters,
    /// Drop category, price and status restrictions everywhere
    ClearFilters,
    /// Echo search input into the draft; promotion happens on settle
    SetSearchText(String),
    /// The debouncer settled on this search text
    SearchSettled(String),
    /// Navigate to a page, clamped to the known page range
    GoToPage(u32),
    NextPage,
    PreviousPage,
    /// Re-issue the fetch for the applied filters
    Refresh,
    FetchCompleted {
        request: FetchRequest,
        outcome: FetchOutcome,
    },
}

// ============================================================================
// Reducer
// ============================================================================

/// Apply `action` to `state`, returning the fetch to issue, if any.
///
/// Explicit apply/clear/refresh always fetch. Search settling and page
/// navigation fetch only when they actually change the applied filters.
pub fn reduce_controller_state(
    state: &mut ControllerState,
    action: ControllerAction,
) -> Option<FetchRequest> {
    match action {
        ControllerAction::SetDraft(patch) => {
            patch.apply_to(&mut state.draft);
            if let Some(text) = patch.search {
                state.draft.search = text;
            }
            None
        }
        ControllerAction::ApplyFilters => {
            state.draft.clamp_price_range();
            state.applied.promote_from(&state.draft);
            Some(state.begin_fetch())
        }
        ControllerAction::ClearFilters => {
            state.draft.clear_filters();
            state.applied.clear_filters();
            Some(state.begin_fetch())
        }
        ControllerAction::SetSearchText(text) => {
            state.draft.search = text;
            None
        }
        ControllerAction::SearchSettled(text) => {
            if text != state.draft.search {
                tracing::trace!("ignoring settled search text that no longer matches input");
                return None;
            }
            if state.applied.search == text && state.applied.page == 1 {
                return None;
            }
            tracing::debug!(search = %text, "search text settled");
            state.applied.search = text;
            state.applied.page = 1;
            Some(state.begin_fetch())
        }
        ControllerAction::GoToPage(page) => go_to_page(state, page),
        ControllerAction::NextPage => {
            let next = state.applied.page.saturating_add(1);
            go_to_page(state, next)
        }
        ControllerAction::PreviousPage => {
            let previous = state.applied.page.saturating_sub(1);
            go_to_page(state, previous)
        }
        ControllerAction::Refresh => Some(state.begin_fetch()),
        ControllerAction::FetchCompleted { request, outcome } => {
            complete_fetch(state, request, outcome);
            None
        }
    }
}

fn go_to_page(state: &mut ControllerState, page: u32) -> Option<FetchRequest> {
    let total_pages = state.pagination.total_pages;
    if total_pages <= 1 {
        return None;
    }

    let target = page.clamp(1, total_pages);
    if target != page {
        tracing::debug!(requested = page, target, total_pages, "clamped page request");
    }
    if target == state.applied.page {
        return None;
    }

    state.applied.page = target;
    Some(state.begin_fetch())
}

fn complete_fetch(state: &mut ControllerState, request: FetchRequest, outcome: FetchOutcome) {
    if request.generation != state.generation {
        tracing::debug!(
            stale = request.generation,
            current = state.generation,
            "discarding stale search response"
        );
        return;
    }

    state.loading = false;
    match outcome {
        FetchOutcome::Success(page) => {
            state.pagination = normalize(&page.raw_meta, request.filters.page, request.filters.limit);
            state.items = page.items;
            state.error = None;
        }
        FetchOutcome::Failure(message) => {
            state.items.clear();
            state.pagination = PaginationMeta::empty(request.filters.page, request.filters.limit);
            state.error = Some(message);
        }
    }
}

impl Model for ControllerState {
    type Action = ControllerAction;
    type Snapshot = ControllerSnapshot;

    fn start(&mut self) -> Option<FetchRequest> {
        Some(self.begin_fetch())
    }

    fn reduce(&mut self, action: ControllerAction) -> Option<FetchRequest> {
        reduce_controller_state(self, action)
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerState::snapshot(self)
    }

    fn debounced_text(action: &ControllerAction) -> Option<String> {
        match action {
            ControllerAction::SetSearchText(text) => Some(text.clone()),
            ControllerAction::SetDraft(patch) => patch.search.clone(),
            _ => None,
        }
    }

    fn search_settled(text: String) -> ControllerAction {
        ControllerAction::SearchSettled(text)
    }

    fn fetch_completed(request: FetchRequest, outcome: FetchOutcome) -> ControllerAction {
        ControllerAction::FetchCompleted { request, outcome }
    }
}
