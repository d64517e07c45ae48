//! Filtered, paginated product listing controllers.
//!
//! `FilteredPaginationController` keeps a draft and an applied copy of the
//! filters, debounces free-text search, fetches through an injected
//! [`ProductSearch`] whenever the applied filters change, and exposes the
//! latest `{items, loading, error, pagination, draft, applied}` snapshot.
//! `FeedController` is the infinite-scroll variant that accumulates pages.

pub mod feed;
pub mod model;
pub mod runtime;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::Config;
use crate::error::Result;
use crate::filter::{FilterPatch, FilterState};
use crate::search::ProductSearch;

pub use feed::{FeedAction, FeedController, FeedSnapshot, FeedState, reduce_feed_state};
pub use model::{ControllerAction, ControllerSnapshot, ControllerState, reduce_controller_state};
pub use runtime::{FetchOutcome, FetchRequest, Model, Runtime};

/// Default quiet period before typed search text is applied
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Construction options shared by the controllers
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Filters in effect when the controller starts
    pub initial: FilterState,
    pub search_debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            initial: FilterState::default(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl ControllerOptions {
    /// Options taken from the user configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial: FilterState::new(config.page_size()),
            search_debounce: config.search_debounce(),
        }
    }

    pub fn with_initial(mut self, initial: FilterState) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }
}

/// Paginated product listing with draft/applied filters.
///
/// Every operation resolves once the controller has processed it and
/// returns the resulting snapshot; fetches it triggers complete later and
/// are observed through [`snapshot`](Self::snapshot), [`subscribe`](Self::subscribe)
/// or [`wait_for`](Self::wait_for). Dropping the controller stops it and
/// cancels any pending search debounce.
pub struct FilteredPaginationController {
    runtime: Runtime<ControllerState>,
}

impl FilteredPaginationController {
    /// Start the controller and issue the fetch for the initial filters.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(search: Arc<S>, options: ControllerOptions) -> Self
    where
        S: ProductSearch + ?Sized + 'static,
    {
        let mut initial = options.initial;
        initial.clamp_price_range();
        let state = ControllerState::new(initial);
        Self {
            runtime: Runtime::spawn(state, search, options.search_debounce),
        }
    }

    /// Merge a partial update into the draft filters.
    ///
    /// No fetch happens, except that a `search` field goes through the
    /// search debouncer exactly like [`set_search_text`](Self::set_search_text).
    pub async fn set_draft(&self, patch: FilterPatch) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::SetDraft(patch)).await
    }

    /// Promote the draft filters, reset to page 1 and fetch
    pub async fn apply_filters(&self) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::ApplyFilters).await
    }

    /// Drop category, price and status filters (keeping search) and fetch
    pub async fn clear_filters(&self) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::ClearFilters).await
    }

    /// Echo search input into the draft and apply it once typing settles
    pub async fn set_search_text(&self, text: impl Into<String>) -> Result<ControllerSnapshot> {
        self.runtime
            .dispatch(ControllerAction::SetSearchText(text.into()))
            .await
    }

    /// Navigate to `page`, clamped to `[1, total_pages]`
    pub async fn go_to_page(&self, page: u32) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::GoToPage(page)).await
    }

    pub async fn next_page(&self) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::NextPage).await
    }

    pub async fn previous_page(&self) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::PreviousPage).await
    }

    /// Fetch the applied filters again (e.g. after an error)
    pub async fn refresh(&self) -> Result<ControllerSnapshot> {
        self.runtime.dispatch(ControllerAction::Refresh).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.runtime.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.runtime.subscribe()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ControllerSnapshot) -> bool,
    ) -> Result<ControllerSnapshot> {
        self.runtime.wait_for(predicate).await
    }

    /// Wait until no fetch is outstanding
    pub async fn wait_idle(&self) -> Result<ControllerSnapshot> {
        self.runtime.wait_for(|s| !s.loading).await
    }

    /// Stop the controller, cancelling any pending search debounce
    pub async fn shutdown(self) {
        self.runtime.shutdown().await;
    }
}
