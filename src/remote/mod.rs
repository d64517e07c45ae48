//! Marketplace backend access.
//!
//! This module provides the HTTP implementation of [`ProductSearch`](crate::search::ProductSearch)
//! used by the controllers, the category listing, and the session that
//! carries the bearer token between requests.

pub mod products;
pub mod session;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{Result, StorefrontError};

pub use products::{CategoryClient, ProductClient};
pub use session::Session;

/// Which product listing a client searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Public catalog (`POST /products/search`)
    #[default]
    Storefront,
    /// The logged-in seller's own products (`POST /products/my-products`)
    Seller,
}

impl SearchScope {
    pub fn path(&self) -> &'static str {
        match self {
            SearchScope::Storefront => "products/search",
            SearchScope::Seller => "products/my-products",
        }
    }

    /// Status filtering is only meaningful for a seller's own listing
    pub fn sends_status(&self) -> bool {
        matches!(self, SearchScope::Seller)
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchScope::Storefront => write!(f, "storefront"),
            SearchScope::Seller => write!(f, "seller"),
        }
    }
}

/// Uniform `{success, message, data}` result of a backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Wrap a client result, keeping the error text as the message
    pub fn from_result(result: Result<T>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => Self::ok(data, message),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    pub fn into_result(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(StorefrontError::Api(non_empty_message(
                self.message,
                "response carried no data",
            ))),
            (false, _) => Err(StorefrontError::Api(non_empty_message(
                self.message,
                "request failed",
            ))),
        }
    }
}

fn non_empty_message(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Unwrap a response body that may or may not be wrapped in an envelope.
///
/// Bodies carrying a boolean `success` field are treated as envelopes; any
/// other body is the payload itself.
pub(crate) fn unwrap_payload<T: DeserializeOwned>(body: Value) -> Result<T> {
    if body.get("success").is_some_and(Value::is_boolean) {
        let envelope: ApiEnvelope<T> = serde_json::from_value(body)?;
        return envelope.into_result();
    }
    Ok(serde_json::from_value(body)?)
}

/// Best-effort error text from a failed response body
pub(crate) fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| match v.get("message") {
        Some(Value::String(s)) => Some(s.clone()),
        // Validation failures arrive as a list of messages
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    });
    message.unwrap_or_else(|| format!("HTTP {status}"))
}

/// Join `path` onto `base`, treating `base` as a directory
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://shop.example.com/api").unwrap();
        assert_eq!(
            endpoint(&base, "products/search").unwrap().as_str(),
            "https://shop.example.com/api/products/search"
        );

        let root = Url::parse("http://localhost:3000").unwrap();
        assert_eq!(
            endpoint(&root, SearchScope::Seller.path()).unwrap().as_str(),
            "http://localhost:3000/products/my-products"
        );
    }

    #[test]
    fn test_envelope_into_result() {
        let ok: ApiEnvelope<u32> = ApiEnvelope::ok(3, "loaded");
        assert_eq!(ok.into_result().unwrap(), 3);

        let failed: ApiEnvelope<u32> = ApiEnvelope::failed("Error al cargar productos");
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Error al cargar productos");

        let empty: ApiEnvelope<u32> = ApiEnvelope::failed("");
        assert_eq!(empty.into_result().unwrap_err().to_string(), "request failed");
    }

    #[test]
    fn test_envelope_from_result() {
        let envelope: ApiEnvelope<u32> =
            ApiEnvelope::from_result(Err(StorefrontError::Unauthorized), "unused");
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert!(envelope.message.contains("log in"));
    }

    #[test]
    fn test_unwrap_payload_accepts_both_shapes() {
        let bare: Vec<u32> = unwrap_payload(json!([1, 2])).unwrap();
        assert_eq!(bare, vec![1, 2]);

        let wrapped: Vec<u32> =
            unwrap_payload(json!({"success": true, "message": "", "data": [4]})).unwrap();
        assert_eq!(wrapped, vec![4]);

        let failed = unwrap_payload::<Vec<u32>>(json!({"success": false, "message": "nope"}));
        assert!(matches!(failed, Err(StorefrontError::Api(m)) if m == "nope"));
    }

    #[test]
    fn test_error_message_extraction() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(error_message(r#"{"message":"bad page"}"#, status), "bad page");
        assert_eq!(
            error_message(r#"{"message":["limit too big","page must be positive"]}"#, status),
            "limit too big; page must be positive"
        );
        assert_eq!(error_message("<html>", status), "HTTP 400 Bad Request");
    }

    #[test]
    fn test_scope_status_rule() {
        assert!(!SearchScope::Storefront.sends_status());
        assert!(SearchScope::Seller.sends_status());
        assert_eq!(SearchScope::default(), SearchScope::Storefront);
    }
}
