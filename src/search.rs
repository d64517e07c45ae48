//! The product search operation consumed by the controllers.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::filter::FilterState;
use crate::types::Product;

/// One page of search results as delivered by the backend.
///
/// `raw_meta` is the untouched payload that carried the pagination fields;
/// it goes through [`crate::pagination::normalize`] before anyone reads it.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<Product>,
    pub raw_meta: Value,
}

impl SearchPage {
    pub fn new(items: Vec<Product>, raw_meta: Value) -> Self {
        Self { items, raw_meta }
    }
}

/// Asynchronous product search, injected into the controllers.
///
/// Timeouts and retries are the implementation's concern; the controllers
/// only see the final result.
#[async_trait::async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, filters: &FilterState) -> Result<SearchPage>;
}

#[async_trait::async_trait]
impl<S: ProductSearch + ?Sized> ProductSearch for Arc<S> {
    async fn search(&self, filters: &FilterState) -> Result<SearchPage> {
        (**self).search(filters).await
    }
}
