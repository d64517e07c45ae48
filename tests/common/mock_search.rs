//! Product search double whose responses are released by the test.
//!
//! Every call the controller makes shows up as a [`PendingCall`]; the test
//! decides when (and in which order) each one completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use storefront::error::{Result, StorefrontError};
use storefront::filter::FilterState;
use storefront::search::{ProductSearch, SearchPage};
use storefront::types::Product;
use tokio::sync::{Mutex, mpsc, oneshot};

/// A search call waiting for the test to answer it
pub struct PendingCall {
    pub filters: FilterState,
    responder: oneshot::Sender<Result<SearchPage>>,
}

impl PendingCall {
    pub fn respond(self, page: SearchPage) {
        let _ = self.responder.send(Ok(page));
    }

    /// Answer with a slice of a catalog of `total` products
    pub fn respond_catalog(self, total: usize, tag: &str) {
        let page = catalog_page(&self.filters, total, tag);
        self.respond(page);
    }

    pub fn fail(self, message: &str) {
        let _ = self
            .responder
            .send(Err(StorefrontError::Api(message.to_string())));
    }
}

pub struct GatedSearch {
    calls: AtomicUsize,
    arrivals_tx: mpsc::UnboundedSender<PendingCall>,
    arrivals_rx: Mutex<mpsc::UnboundedReceiver<PendingCall>>,
}

impl GatedSearch {
    pub fn new() -> Arc<Self> {
        let (arrivals_tx, arrivals_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            arrivals_tx,
            arrivals_rx: Mutex::new(arrivals_rx),
        })
    }

    /// Wait for the next search call
    pub async fn next_call(&self) -> PendingCall {
        self.arrivals_rx
            .lock()
            .await
            .recv()
            .await
            .expect("search double closed")
    }

    /// Number of search calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProductSearch for GatedSearch {
    async fn search(&self, filters: &FilterState) -> Result<SearchPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (responder, response) = oneshot::channel();
        let _ = self.arrivals_tx.send(PendingCall {
            filters: filters.clone(),
            responder,
        });
        response
            .await
            .unwrap_or_else(|_| Err(StorefrontError::Api("call abandoned".to_string())))
    }
}

pub fn product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        seller_id: Some("seller-1".to_string()),
        name: format!("Product {id}"),
        description: None,
        price: "19.99".to_string(),
        stock: 3,
        status: Some("ACTIVE".to_string()),
        image_path: None,
        categories: vec![],
    }
}

/// The page of a `total`-item catalog selected by `filters`, with ids
/// `{tag}-{index}`
pub fn catalog_page(filters: &FilterState, total: usize, tag: &str) -> SearchPage {
    let limit = filters.limit as usize;
    let start = (filters.page as usize - 1) * limit;
    let items = (start..total.min(start + limit))
        .map(|i| product(&format!("{tag}-{i}")))
        .collect();
    SearchPage::new(
        items,
        json!({"total": total, "page": filters.page, "limit": filters.limit}),
    )
}
