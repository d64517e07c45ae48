//! Filter criteria for product listings
//!
//! `FilterState` is held twice by the controller: a draft copy edited freely
//! by the UI and an applied copy that is actually sent to the backend.
//! An unset filter is always `None` (or an empty set), never a zero value,
//! because `0` is a legitimate price bound.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::types::{CategoryId, ProductStatus};

/// Page size used by the storefront grid when nothing else is configured
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Filter criteria plus the pagination cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Free-text search matched against product names
    pub search: String,
    /// Category restriction (empty = all categories)
    pub category_ids: BTreeSet<CategoryId>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Listing status (seller views only, `None` = both)
    pub status: Option<ProductStatus>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FilterState {
    /// Create an empty filter on page 1 with the given page size
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            search: String::new(),
            category_ids: BTreeSet::new(),
            min_price: None,
            max_price: None,
            status: None,
        }
    }

    /// Set the page, keeping it >= 1
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Set the page size, keeping it >= 1
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.max(1);
    }

    /// Add the category if absent, remove it if present
    pub fn toggle_category(&mut self, id: impl Into<CategoryId>) {
        let id = id.into();
        if !self.category_ids.remove(&id) {
            self.category_ids.insert(id);
        }
    }

    /// Number of active non-search filters.
    ///
    /// Each selected category counts once, each price bound counts once,
    /// and a status restriction counts once.
    pub fn active_filter_count(&self) -> usize {
        self.category_ids.len()
            + usize::from(self.min_price.is_some())
            + usize::from(self.max_price.is_some())
            + usize::from(self.status.is_some())
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Enforce `min_price <= max_price` and drop invalid bounds.
    ///
    /// Negative or non-finite bounds are treated as unset. When both bounds
    /// are present and the minimum exceeds the maximum, the minimum is
    /// lowered to the maximum.
    pub fn clamp_price_range(&mut self) {
        self.min_price = self.min_price.filter(|p| p.is_finite() && *p >= 0.0);
        self.max_price = self.max_price.filter(|p| p.is_finite() && *p >= 0.0);

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            self.min_price = Some(max);
        }
    }

    /// Reset category, price and status restrictions and go back to page 1.
    /// The search text is preserved.
    pub fn clear_filters(&mut self) {
        self.category_ids.clear();
        self.min_price = None;
        self.max_price = None;
        self.status = None;
        self.page = 1;
    }

    /// Copy the user-editable filters from `draft` and reset to page 1.
    ///
    /// Search text is not copied: it is promoted separately once typing
    /// settles.
    pub fn promote_from(&mut self, draft: &FilterState) {
        self.category_ids = draft.category_ids.clone();
        self.min_price = draft.min_price;
        self.max_price = draft.max_price;
        self.status = draft.status;
        self.limit = draft.limit.max(1);
        self.page = 1;
        self.clamp_price_range();
    }

    /// Search text trimmed of surrounding whitespace, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// A partial update to a draft `FilterState`.
///
/// Fields left as `None` are untouched. The nested `Option` on the price and
/// status fields distinguishes "leave alone" from "unset".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub search: Option<String>,
    pub category_ids: Option<BTreeSet<CategoryId>>,
    pub min_price: Option<Option<f64>>,
    pub max_price: Option<Option<f64>>,
    pub status: Option<Option<ProductStatus>>,
    pub limit: Option<u32>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn categories<I, C>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CategoryId>,
    {
        self.category_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_price(mut self, price: f64) -> Self {
        self.min_price = Some(Some(price));
        self
    }

    pub fn clear_min_price(mut self) -> Self {
        self.min_price = Some(None);
        self
    }

    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(Some(price));
        self
    }

    pub fn clear_max_price(mut self) -> Self {
        self.max_price = Some(None);
        self
    }

    pub fn status(mut self, status: ProductStatus) -> Self {
        self.status = Some(Some(status));
        self
    }

    pub fn clear_status(mut self) -> Self {
        self.status = Some(None);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the patch touches anything besides the search text
    pub fn has_filter_changes(&self) -> bool {
        self.category_ids.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.status.is_some()
            || self.limit.is_some()
    }

    /// Merge every field except `search` into `state`
    pub fn apply_to(&self, state: &mut FilterState) {
        if let Some(ids) = &self.category_ids {
            state.category_ids = ids.clone();
        }
        if let Some(min) = self.min_price {
            state.min_price = min;
        }
        if let Some(max) = self.max_price {
            state.max_price = max;
        }
        if let Some(status) = self.status {
            state.status = status;
        }
        if let Some(limit) = self.limit {
            state.set_limit(limit);
        }
    }
}

/// Body of a product search request.
///
/// Unset filters are omitted entirely rather than sent as zero or empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<CategoryId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

impl From<&FilterState> for SearchRequest {
    fn from(state: &FilterState) -> Self {
        let category_ids = if state.category_ids.is_empty() {
            None
        } else {
            Some(state.category_ids.iter().cloned().collect())
        };

        Self {
            page: state.page.max(1),
            limit: state.limit.max(1),
            search: state.search_text().map(str::to_string),
            category_ids,
            min_price: state.min_price,
            max_price: state.max_price,
            status: state.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_enforces_positive_limit() {
        let state = FilterState::new(0);
        assert_eq!(state.limit, 1);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_set_page_floors_at_one() {
        let mut state = FilterState::default();
        state.set_page(0);
        assert_eq!(state.page, 1);
        state.set_page(7);
        assert_eq!(state.page, 7);
    }

    #[test]
    fn test_toggle_category() {
        let mut state = FilterState::default();
        state.toggle_category("a");
        state.toggle_category("b");
        assert_eq!(state.category_ids.len(), 2);
        state.toggle_category("a");
        assert_eq!(
            state.category_ids.iter().collect::<Vec<_>>(),
            vec![&CategoryId::from("b")]
        );
    }

    #[test]
    fn test_active_filter_count() {
        let mut state = FilterState::default();
        assert!(!state.has_active_filters());

        state.toggle_category("a");
        state.toggle_category("b");
        state.min_price = Some(0.0);
        state.status = Some(ProductStatus::Inactive);
        state.search = "ignored".to_string();

        assert_eq!(state.active_filter_count(), 4);
    }

    #[test]
    fn test_clamp_lowers_min_to_max() {
        let mut state = FilterState {
            min_price: Some(50.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        state.clamp_price_range();
        assert_eq!(state.min_price, Some(20.0));
        assert_eq!(state.max_price, Some(20.0));
    }

    #[test]
    fn test_clamp_drops_invalid_bounds() {
        let mut state = FilterState {
            min_price: Some(-1.0),
            max_price: Some(f64::NAN),
            ..Default::default()
        };
        state.clamp_price_range();
        assert_eq!(state.min_price, None);
        assert_eq!(state.max_price, None);
    }

    #[test]
    fn test_clear_filters_preserves_search() {
        let mut state = FilterState {
            page: 3,
            search: "shoe".to_string(),
            min_price: Some(5.0),
            status: Some(ProductStatus::Active),
            ..Default::default()
        };
        state.toggle_category("a");

        state.clear_filters();

        assert_eq!(state.search, "shoe");
        assert!(state.category_ids.is_empty());
        assert_eq!(state.min_price, None);
        assert_eq!(state.status, None);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_promote_resets_page_and_keeps_search() {
        let mut applied = FilterState {
            page: 5,
            search: "lamp".to_string(),
            ..Default::default()
        };
        let draft = FilterState {
            search: "typed but not settled".to_string(),
            min_price: Some(10.0),
            ..Default::default()
        };

        applied.promote_from(&draft);

        assert_eq!(applied.page, 1);
        assert_eq!(applied.min_price, Some(10.0));
        assert_eq!(applied.search, "lamp");
    }

    #[test]
    fn test_patch_distinguishes_untouched_from_unset() {
        let mut state = FilterState {
            min_price: Some(3.0),
            max_price: Some(9.0),
            ..Default::default()
        };

        FilterPatch::new().clear_min_price().apply_to(&mut state);

        assert_eq!(state.min_price, None);
        assert_eq!(state.max_price, Some(9.0));
    }

    #[test]
    fn test_search_only_patch_has_no_filter_changes() {
        assert!(!FilterPatch::new().search("mug").has_filter_changes());
        assert!(FilterPatch::new().search("mug").clear_status().has_filter_changes());
    }

    #[test]
    fn test_patch_does_not_touch_search() {
        let mut state = FilterState::default();
        FilterPatch::new().search("x").limit(24).apply_to(&mut state);
        assert_eq!(state.search, "");
        assert_eq!(state.limit, 24);
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let state = FilterState {
            search: "   ".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(SearchRequest::from(&state)).unwrap();
        assert_eq!(body, serde_json::json!({ "page": 1, "limit": 12 }));
    }

    #[test]
    fn test_request_keeps_zero_price_bound() {
        let mut state = FilterState {
            search: " shoe ".to_string(),
            min_price: Some(0.0),
            max_price: Some(100.0),
            status: Some(ProductStatus::Active),
            ..Default::default()
        };
        state.toggle_category("c-2");
        state.toggle_category("c-1");

        let body = serde_json::to_value(SearchRequest::from(&state)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "page": 1,
                "limit": 12,
                "search": "shoe",
                "category_ids": ["c-1", "c-2"],
                "min_price": 0.0,
                "max_price": 100.0,
                "status": "active",
            })
        );
    }
}
