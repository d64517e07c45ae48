//! Configuration commands for managing storefront settings.
//!
//! - `config set`: Set a configuration value
//! - `config show`: Display current configuration

use owo_colors::OwoColorize;
use serde_json::json;

use crate::commands::print_json;
use crate::config::Config;
use crate::error::Result;

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

/// Show current configuration
pub fn cmd_config_show(json: bool) -> Result<()> {
    let config = Config::load()?;
    let api_url = config.api_url()?;
    let token = config.token().map(|t| mask_sensitive_value(&t));

    if json {
        return print_json(&json!({
            "api_url": api_url.as_str(),
            "auth": {
                "token_configured": token.is_some(),
                "token": token,
            },
            "page_size": config.page_size(),
            "search_debounce_ms": config.search_debounce_ms,
            "request_timeout": config.request_timeout,
            "config_file": Config::config_path().to_string_lossy(),
        }));
    }

    println!("{}\n", "Configuration:".cyan().bold());
    println!("{}: {}", "api_url".cyan(), api_url);
    let token_status = match token {
        Some(masked) => masked.green().to_string(),
        None => "not configured".dimmed().to_string(),
    };
    println!("{}: {}", "auth.token".cyan(), token_status);
    println!("{}: {}", "page_size".cyan(), config.page_size());
    println!(
        "{}: {}",
        "search_debounce_ms".cyan(),
        config.search_debounce_ms
    );
    println!("{}: {}", "request_timeout".cyan(), config.request_timeout);
    println!();
    println!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    );

    Ok(())
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, json: bool) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    if json {
        print_json(&json!({
            "action": "config_set",
            "key": key,
            "success": true,
        }))
    } else {
        println!("Set {}", key.cyan());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_mask_sensitive_value() {
        assert_eq!(mask_sensitive_value("abcdefgh"), "ab...gh");
        assert_eq!(mask_sensitive_value("abc"), "****");
    }

    #[test]
    #[serial]
    fn test_config_set_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::set_var(crate::config::CONFIG_PATH_ENV, &path) };

        cmd_config_set("page_size", "20", true).unwrap();
        assert!(cmd_config_set("page_size", "zero", true).is_err());
        let loaded = Config::load().unwrap();

        unsafe { std::env::remove_var(crate::config::CONFIG_PATH_ENV) };
        assert_eq!(loaded.page_size, 20);
    }
}
