mod config;
mod pages;
mod search;

pub use config::{cmd_config_set, cmd_config_show};
pub use pages::{cmd_pages, render_page_row};
pub use search::{SearchOptions, cmd_search};

use serde::Serialize;

use crate::error::Result;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
