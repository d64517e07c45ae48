//! Product search command
//!
//! Runs one listing through the paginated controller: the initial fetch,
//! then navigation to the requested page (clamped to the pages that exist).

use std::collections::HashMap;
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::commands::{print_json, render_page_row};
use crate::config::Config;
use crate::controller::{ControllerOptions, ControllerSnapshot, FilteredPaginationController};
use crate::error::{Result, StorefrontError};
use crate::filter::{FilterState, SearchRequest};
use crate::pagination::page_numbers;
use crate::remote::{CategoryClient, ProductClient, SearchScope, Session};
use crate::types::{Category, CategoryId, ProductStatus};

/// Arguments of `storefront search`
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: Option<String>,
    /// Category ids or names
    pub categories: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub status: Option<ProductStatus>,
    pub page: u32,
    pub limit: Option<u32>,
    pub seller: bool,
    pub json: bool,
}

/// A row in the product table
#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: u32,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Categories")]
    categories: String,
}

/// Execute the search command
pub async fn cmd_search(options: SearchOptions) -> Result<()> {
    if let (Some(min), Some(max)) = (options.min_price, options.max_price)
        && min > max
    {
        return Err(StorefrontError::InvalidInput(format!(
            "--min-price ({min}) is greater than --max-price ({max})"
        )));
    }
    if options.status.is_some() && !options.seller {
        return Err(StorefrontError::InvalidInput(
            "--status only applies to --seller listings".to_string(),
        ));
    }

    let config = Config::load()?;
    let scope = if options.seller {
        SearchScope::Seller
    } else {
        SearchScope::Storefront
    };
    // Both clients share one session; a 401 on either clears it
    let session = Session::new(config.token());
    let client = ProductClient::from_config(&config, scope, session.clone())?;

    // Names are only needed for the table, or to resolve --category by name
    let categories = if !options.json || !options.categories.is_empty() {
        load_categories(&config, session).await
    } else {
        Vec::new()
    };

    let mut initial = FilterState::new(options.limit.unwrap_or_else(|| config.page_size()));
    initial.search = options.query.clone().unwrap_or_default();
    for category in &options.categories {
        initial.toggle_category(resolve_category(category, &categories));
    }
    initial.min_price = options.min_price;
    initial.max_price = options.max_price;
    initial.status = options.status;

    let controller = FilteredPaginationController::spawn(
        Arc::new(client),
        ControllerOptions::from_config(&config).with_initial(initial),
    );

    let mut snapshot = controller.wait_idle().await?;
    if snapshot.error.is_none() && options.page > 1 {
        controller.go_to_page(options.page).await?;
        snapshot = controller.wait_idle().await?;
    }
    controller.shutdown().await;

    if let Some(message) = &snapshot.error {
        return Err(StorefrontError::Api(message.clone()));
    }

    if options.json {
        print_json(&json!({
            "scope": scope,
            "filters": SearchRequest::from(&snapshot.applied),
            "active_filters": snapshot.applied.active_filter_count(),
            "items": snapshot.items,
            "pagination": snapshot.pagination,
            "pages": page_numbers(snapshot.pagination.page, snapshot.pagination.total_pages),
        }))
    } else {
        print_table(&snapshot, &categories);
        Ok(())
    }
}

async fn load_categories(config: &Config, session: Session) -> Vec<Category> {
    let client = match CategoryClient::from_config(config, session) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("category client unavailable: {e}");
            return Vec::new();
        }
    };
    match client.list().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!("could not load categories: {e}");
            Vec::new()
        }
    }
}

/// Map a category name to its id; anything else is taken as an id
fn resolve_category(value: &str, categories: &[Category]) -> CategoryId {
    categories
        .iter()
        .find(|c| c.id.as_str() == value || c.name.eq_ignore_ascii_case(value))
        .map(|c| c.id.clone())
        .unwrap_or_else(|| CategoryId::new(value))
}

fn print_table(snapshot: &ControllerSnapshot, categories: &[Category]) {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let query = snapshot.applied.search_text().unwrap_or("");
    if query.is_empty() {
        println!("{}", "Products".cyan().bold());
    } else {
        println!("{} \"{query}\"", "Products matching".cyan().bold());
    }
    let active = snapshot.applied.active_filter_count();
    if active > 0 {
        println!("{}", format!("{active} active filter(s)").dimmed());
    }
    println!();

    if snapshot.items.is_empty() {
        println!("No products found.");
    } else {
        let rows: Vec<ProductRow> = snapshot
            .items
            .iter()
            .map(|p| ProductRow {
                id: p.id.clone(),
                name: p.name.clone(),
                price: p
                    .price_value()
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_else(|| p.price.clone()),
                stock: p.stock,
                status: p.status.clone().unwrap_or_else(|| "-".to_string()),
                categories: p
                    .categories
                    .iter()
                    .map(|id| names.get(id.as_str()).copied().unwrap_or(id.as_str()))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    let meta = &snapshot.pagination;
    println!(
        "\nPage {} of {} ({} product(s))",
        meta.page,
        meta.total_pages.max(1),
        meta.total
    );
    if let Some(slots) = page_numbers(meta.page, meta.total_pages) {
        println!("{}", render_page_row(&slots, meta.page));
    }
}
