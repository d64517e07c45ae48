pub mod commands;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod remote;
pub mod search;
pub mod types;

pub use config::Config;
pub use controller::{
    ControllerAction, ControllerOptions, ControllerSnapshot, FeedController, FeedSnapshot,
    FilteredPaginationController,
};
pub use debounce::Debouncer;
pub use error::{Result, StorefrontError};
pub use filter::{DEFAULT_PAGE_SIZE, FilterPatch, FilterState, SearchRequest};
pub use pagination::{PageSlot, PaginationMeta, has_more, normalize, page_numbers};
pub use remote::{ApiEnvelope, CategoryClient, ProductClient, SearchScope, Session};
pub use search::{ProductSearch, SearchPage};
pub use types::{Category, CategoryId, Product, ProductStatus};
