//! Pagination metadata and page button layout
//!
//! The backend reports pagination in several shapes: a nested `meta`
//! object, flat `total`/`page`/`limit` fields next to the items, or nothing
//! at all. `normalize` folds all of them into one `PaginationMeta`.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Maximum number of page buttons shown before ellipses kick in
const MAX_VISIBLE_PAGES: u32 = 5;

/// Canonical pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Metadata with no results for the given request
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            total: 0,
            page,
            limit,
            total_pages: 0,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Build a `PaginationMeta` from a raw backend payload.
///
/// Each field takes the first usable source in order: `meta.<field>`, the
/// flat `<field>`, then the requested value (or `0` for `total`). Values that
/// are missing, non-numeric, negative or non-finite fall through to the next
/// source. `total_pages` uses `meta.totalPages` when numeric, otherwise
/// `ceil(total / limit)`, and is always a non-negative integer.
pub fn normalize(raw: &Value, requested_page: u32, requested_limit: u32) -> PaginationMeta {
    let meta = raw.get("meta");
    let field = |name: &str| {
        meta.and_then(|m| m.get(name))
            .and_then(non_negative)
            .or_else(|| raw.get(name).and_then(non_negative))
    };

    let total = field("total").map(|t| t as u64).unwrap_or(0);
    let limit = field("limit").map(saturate_u32).unwrap_or(requested_limit);
    let page = field("page").map(saturate_u32).unwrap_or(requested_page);

    let total_pages = match meta.and_then(|m| m.get("totalPages")).and_then(numeric) {
        Some(reported) => reported,
        None if limit > 0 => (total as f64 / limit as f64).ceil(),
        None => 0.0,
    };

    tracing::trace!(total, page, limit, total_pages, "normalized pagination metadata");

    PaginationMeta {
        total,
        page,
        limit,
        total_pages: saturate_u32(total_pages.max(0.0)),
    }
}

/// Read a JSON number, or a string holding one, as a finite float
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n.floor())
}

fn non_negative(value: &Value) -> Option<f64> {
    numeric(value).filter(|n| *n >= 0.0)
}

fn saturate_u32(n: f64) -> u32 {
    if n >= u32::MAX as f64 { u32::MAX } else { n as u32 }
}

/// Infinite-scroll continuation heuristic: a full page implies more pages.
///
/// This over-reports by one fetch when the total is an exact multiple of the
/// page size (the next fetch comes back empty).
pub fn has_more(items_returned: usize, limit: u32) -> bool {
    limit > 0 && items_returned == limit as usize
}

/// One slot in a rendered page button row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSlot::Page(n) => write!(f, "{n}"),
            PageSlot::Ellipsis => write!(f, "…"),
        }
    }
}

impl Serialize for PageSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageSlot::Page(n) => serializer.serialize_u32(*n),
            PageSlot::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

/// Compute which page buttons to show for `current` out of `total_pages`.
///
/// Returns `None` when there is at most one page. Otherwise at most five
/// numbered slots are shown, with ellipses standing in for skipped ranges:
///
/// - up to 5 pages: every page
/// - near the start: `1 2 3 4 … N`
/// - near the end: `1 … N-3 N-2 N-1 N`
/// - in the middle: `1 … c-1 c c+1 … N`
pub fn page_numbers(current: u32, total_pages: u32) -> Option<Vec<PageSlot>> {
    if total_pages <= 1 {
        return None;
    }

    if total_pages <= MAX_VISIBLE_PAGES {
        return Some((1..=total_pages).map(PageSlot::Page).collect());
    }

    let current = current.clamp(1, total_pages);
    let mut slots = Vec::with_capacity(7);

    if current <= 3 {
        slots.extend((1..=4).map(PageSlot::Page));
        slots.push(PageSlot::Ellipsis);
        slots.push(PageSlot::Page(total_pages));
    } else if current >= total_pages - 2 {
        slots.push(PageSlot::Page(1));
        slots.push(PageSlot::Ellipsis);
        slots.extend((total_pages - 3..=total_pages).map(PageSlot::Page));
    } else {
        slots.push(PageSlot::Page(1));
        slots.push(PageSlot::Ellipsis);
        slots.extend((current - 1..=current + 1).map(PageSlot::Page));
        slots.push(PageSlot::Ellipsis);
        slots.push(PageSlot::Page(total_pages));
    }

    Some(slots)
}
