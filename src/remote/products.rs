//! HTTP clients for product search and the category catalog.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::error::{Result, StorefrontError};
use crate::filter::{FilterState, SearchRequest};
use crate::search::{ProductSearch, SearchPage};
use crate::types::{Category, Product};

use super::{SearchScope, Session, endpoint, error_message, unwrap_payload};

/// Keys under which a search response may carry its items
const ITEM_KEYS: &[&str] = &["products", "items"];

/// Product search against the marketplace backend
#[derive(Debug, Clone)]
pub struct ProductClient {
    http: Client,
    base_url: Url,
    scope: SearchScope,
    session: Session,
    timeout: Duration,
}

impl ProductClient {
    pub fn new(base_url: Url, scope: SearchScope, session: Session, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()?;
        Ok(Self {
            http,
            base_url,
            scope,
            session,
            timeout,
        })
    }

    /// Client for `scope` using the configured URL and timeout
    pub fn from_config(config: &Config, scope: SearchScope, session: Session) -> Result<Self> {
        Self::new(config.api_url()?, scope, session, config.request_timeout())
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Request body for `filters` in this client's scope
    pub fn request_body(&self, filters: &FilterState) -> SearchRequest {
        let mut body = SearchRequest::from(filters);
        if !self.scope.sends_status() {
            body.status = None;
        }
        body
    }
}

#[async_trait::async_trait]
impl ProductSearch for ProductClient {
    async fn search(&self, filters: &FilterState) -> Result<SearchPage> {
        if self.scope == SearchScope::Seller && !self.session.is_authenticated() {
            return Err(StorefrontError::Unauthorized);
        }

        let url = endpoint(&self.base_url, self.scope.path())?;
        let body = self.request_body(filters);
        tracing::debug!(%url, page = body.page, limit = body.limit, "POST product search");

        let request = authorize(self.http.post(url).json(&body), &self.session);
        let payload = send(request, &self.session, self.timeout).await?;
        parse_search_page(payload)
    }
}

/// Category catalog (`GET /categories/all`)
#[derive(Debug, Clone)]
pub struct CategoryClient {
    http: Client,
    base_url: Url,
    session: Session,
    timeout: Duration,
}

impl CategoryClient {
    pub fn new(base_url: Url, session: Session, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()?;
        Ok(Self {
            http,
            base_url,
            session,
            timeout,
        })
    }

    pub fn from_config(config: &Config, session: Session) -> Result<Self> {
        Self::new(config.api_url()?, session, config.request_timeout())
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let url = endpoint(&self.base_url, "categories/all")?;
        tracing::debug!(%url, "GET categories");

        let request = authorize(self.http.get(url), &self.session);
        let payload = send(request, &self.session, self.timeout).await?;
        unwrap_payload(payload)
    }
}

fn authorize(request: RequestBuilder, session: &Session) -> RequestBuilder {
    match session.bearer() {
        Some(value) => request.header(header::AUTHORIZATION, value),
        None => request,
    }
}

async fn send(request: RequestBuilder, session: &Session, timeout: Duration) -> Result<Value> {
    let response = request
        .header(header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| transport_error(e, timeout))?;
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("backend rejected credentials, logging out");
        session.clear();
        return Err(StorefrontError::Unauthorized);
    }

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(StorefrontError::Api(error_message(&text, status)));
    }

    response.json().await.map_err(|e| transport_error(e, timeout))
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> StorefrontError {
    if err.is_timeout() {
        StorefrontError::Timeout {
            seconds: timeout.as_secs_f64().ceil() as u64,
        }
    } else {
        err.into()
    }
}

/// Split a search response into its items and the metadata around them.
///
/// The response may be an envelope, an object holding the items under
/// `products` (or `items`), or a bare array. Everything except the items is
/// kept as raw metadata for the normalizer.
pub(crate) fn parse_search_page(body: Value) -> Result<SearchPage> {
    let payload: Value = unwrap_payload(body)?;

    match payload {
        Value::Array(items) => {
            let items: Vec<Product> = serde_json::from_value(Value::Array(items))?;
            Ok(SearchPage::new(items, Value::Null))
        }
        Value::Object(mut map) => {
            let items = ITEM_KEYS
                .iter()
                .find_map(|key| map.remove(*key))
                .unwrap_or(Value::Array(Vec::new()));
            let items: Vec<Product> = match items {
                Value::Null => Vec::new(),
                other => serde_json::from_value(other)?,
            };
            Ok(SearchPage::new(items, Value::Object(map)))
        }
        Value::Null => Ok(SearchPage::default()),
        other => Err(StorefrontError::Api(format!(
            "unexpected search response: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::normalize;
    use crate::types::ProductStatus;
    use serde_json::json;

    fn product_json(id: &str) -> Value {
        json!({"id": id, "name": id, "price": "10.00", "stock": 1})
    }

    #[test]
    fn test_parse_flat_response() {
        let body = json!({
            "products": [product_json("a"), product_json("b")],
            "total": 14,
            "page": 2,
            "limit": 2,
        });

        let page = parse_search_page(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.raw_meta.get("products").is_none());

        let meta = normalize(&page.raw_meta, 1, 12);
        assert_eq!(meta.total, 14);
        assert_eq!(meta.page, 2);
        assert_eq!(meta.total_pages, 7);
    }

    #[test]
    fn test_parse_nested_meta_and_items_key() {
        let body = json!({
            "items": [product_json("a")],
            "meta": {"total": 30, "page": 3, "limit": 10, "totalPages": 3},
        });

        let page = parse_search_page(body).unwrap();
        assert_eq!(page.items.len(), 1);
        let meta = normalize(&page.raw_meta, 1, 12);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.page, 3);
    }

    #[test]
    fn test_parse_enveloped_response() {
        let body = json!({
            "success": true,
            "message": "Productos cargados correctamente",
            "data": {"products": [product_json("a")], "total": 1},
        });
        let page = parse_search_page(body).unwrap();
        assert_eq!(page.items[0].id, "a");
        assert_eq!(page.raw_meta["total"], 1);
    }

    #[test]
    fn test_parse_failed_envelope() {
        let body = json!({"success": false, "message": "Error al cargar productos", "data": null});
        let err = parse_search_page(body).unwrap_err();
        assert_eq!(err.to_string(), "Error al cargar productos");
    }

    #[test]
    fn test_parse_bare_array_and_missing_items() {
        let page = parse_search_page(json!([product_json("a")])).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.raw_meta.is_null());

        let page = parse_search_page(json!({"total": 0})).unwrap();
        assert!(page.items.is_empty());
    }

    fn client(scope: SearchScope, session: Session) -> ProductClient {
        ProductClient::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            scope,
            session,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_status_only_sent_in_seller_scope() {
        let mut filters = FilterState::default();
        filters.status = Some(ProductStatus::Inactive);

        let storefront = client(SearchScope::Storefront, Session::anonymous());
        assert!(storefront.request_body(&filters).status.is_none());

        let seller = client(SearchScope::Seller, Session::anonymous());
        assert_eq!(
            seller.request_body(&filters).status,
            Some(ProductStatus::Inactive)
        );
    }

    #[tokio::test]
    async fn test_seller_scope_requires_session() {
        let seller = client(SearchScope::Seller, Session::anonymous());
        let err = seller.search(&FilterState::default()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Unauthorized));
    }

    /// Backend that answers a single request with 401
    fn rejecting_backend() -> Url {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket.write_all(
                b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            );
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_token_logs_out_every_client() {
        let session = Session::new(Some("stale-token".to_string()));
        let categories =
            CategoryClient::new(rejecting_backend(), session.clone(), Duration::from_secs(5)).unwrap();
        let products = client(SearchScope::Seller, session);

        let err = categories.list().await.unwrap_err();
        assert!(matches!(err, StorefrontError::Unauthorized));
        assert!(!products.session().is_authenticated());

        let err = products.search(&FilterState::default()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Unauthorized));
    }

    #[tokio::test]
    async fn test_unresponsive_backend_times_out() {
        // Connections queue in the backlog but are never answered
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = ProductClient::new(
            Url::parse(&format!("http://{addr}")).unwrap(),
            SearchScope::Storefront,
            Session::anonymous(),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = client.search(&FilterState::default()).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Timeout { seconds: 1 }));
        drop(listener);
    }
}
