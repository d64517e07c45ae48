use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use storefront::commands::{
    SearchOptions, cmd_config_set, cmd_config_show, cmd_pages, cmd_search,
};
use storefront::config::CONFIG_KEYS;
use storefront::types::ProductStatus;

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "STOREFRONT_LOG";

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Browse marketplace products from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products with filters and pagination
    #[command(visible_alias = "s")]
    Search {
        /// Free-text search
        query: Option<String>,

        /// Category id or name (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Minimum price
        #[arg(long)]
        min_price: Option<f64>,

        /// Maximum price
        #[arg(long)]
        max_price: Option<f64>,

        /// Status: active, inactive (seller listings only)
        #[arg(long, value_parser = parse_status)]
        status: Option<ProductStatus>,

        /// Page to show (clamped to the last page)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Items per page (default: page_size from config)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Search your own products instead of the public catalog
        #[arg(long)]
        seller: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the page buttons for a position in a listing
    Pages {
        /// Current page
        current: u32,

        /// Total number of pages
        total: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a configuration value
    Set {
        /// Key: api_url, auth.token, page_size, search_debounce_ms, request_timeout
        #[arg(value_parser = parse_config_key)]
        key: String,

        /// Value to set
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_status(s: &str) -> Result<ProductStatus, String> {
    s.parse()
        .map_err(|_| "Invalid status. Must be one of: active, inactive".to_string())
}

fn parse_config_key(s: &str) -> Result<String, String> {
    if CONFIG_KEYS.contains(&s) {
        Ok(s.to_string())
    } else {
        Err(format!(
            "Invalid key. Must be one of: {}",
            CONFIG_KEYS.join(", ")
        ))
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search {
            query,
            categories,
            min_price,
            max_price,
            status,
            page,
            limit,
            seller,
            json,
        } => {
            cmd_search(SearchOptions {
                query,
                categories,
                min_price,
                max_price,
                status,
                page,
                limit,
                seller,
                json,
            })
            .await
        }
        Commands::Pages {
            current,
            total,
            json,
        } => cmd_pages(current, total, json),
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(json),
            ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
