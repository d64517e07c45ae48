//! Page button row rendering

use owo_colors::OwoColorize;
use serde_json::json;

use crate::commands::print_json;
use crate::error::Result;
use crate::pagination::{PageSlot, page_numbers};

/// Render `slots` as a single line, highlighting `current`
pub fn render_page_row(slots: &[PageSlot], current: u32) -> String {
    let mut parts = Vec::with_capacity(slots.len() + 2);
    let first = matches!(slots.first(), Some(PageSlot::Page(1))) && current <= 1;
    let last = matches!(slots.last(), Some(PageSlot::Page(n)) if *n <= current);

    parts.push(if first {
        "‹".dimmed().to_string()
    } else {
        "‹".to_string()
    });
    for slot in slots {
        match slot {
            PageSlot::Page(n) if *n == current => {
                parts.push(format!("[{n}]").cyan().bold().to_string())
            }
            other => parts.push(other.to_string()),
        }
    }
    parts.push(if last {
        "›".dimmed().to_string()
    } else {
        "›".to_string()
    });

    parts.join(" ")
}

/// Print the page buttons shown for `current` out of `total_pages`
pub fn cmd_pages(current: u32, total_pages: u32, json: bool) -> Result<()> {
    let slots = page_numbers(current, total_pages);

    if json {
        return print_json(&json!({
            "current": current.clamp(1, total_pages.max(1)),
            "total_pages": total_pages,
            "slots": slots,
        }));
    }

    match slots {
        Some(slots) => println!("{}", render_page_row(&slots, current)),
        None => println!("{}", "(single page, no navigation)".dimmed()),
    }
    Ok(())
}
