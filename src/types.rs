//! Marketplace domain types shared by the filter core and the HTTP client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorefrontError};

/// Opaque category identifier assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        CategoryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        CategoryId(s.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(s: String) -> Self {
        CategoryId(s)
    }
}

/// Listing status of a product, filterable only in seller-scoped views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for ProductStatus {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            _ => Err(StorefrontError::InvalidInput(format!(
                "unknown status '{s}', expected 'active' or 'inactive'"
            ))),
        }
    }
}

/// A product as returned by the search endpoints.
///
/// The backend sends `price` as a decimal string and `status` in either
/// case (`ACTIVE`, `active`, `DELETED`...), so both are kept as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub seller_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Product {
    /// Parsed price, `None` when the backend sent something non-numeric
    pub fn price_value(&self) -> Option<f64> {
        self.price.trim().parse::<f64>().ok().filter(|p| p.is_finite())
    }
}

/// A product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "ACTIVE".parse::<ProductStatus>().unwrap(),
            ProductStatus::Active
        );
        assert_eq!(
            "inactive".parse::<ProductStatus>().unwrap(),
            ProductStatus::Inactive
        );
        assert!("deleted".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_product_deserializes_backend_shape() {
        let json = r#"{
            "id": "p-1",
            "seller_id": "s-9",
            "name": "Running shoe",
            "price": "129.90",
            "stock": 4,
            "status": "ACTIVE",
            "created_at": "2024-01-01T00:00:00Z",
            "categories": ["c-1"]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.name, "Running shoe");
        assert_eq!(product.price_value(), Some(129.90));
        assert_eq!(product.categories, vec!["c-1".to_string()]);
        assert!(product.image_path.is_none());
    }

    #[test]
    fn test_price_value_rejects_garbage() {
        let product = Product {
            id: "p".to_string(),
            seller_id: None,
            name: "x".to_string(),
            description: None,
            price: "n/a".to_string(),
            stock: 0,
            status: None,
            image_path: None,
            categories: vec![],
        };
        assert_eq!(product.price_value(), None);
    }
}
