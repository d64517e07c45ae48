//! Top-level application configuration.
//!
//! Configuration is stored in `.storefront/config.yaml` and includes:
//! - The backend API base URL
//! - The bearer token used for seller-scoped requests
//! - Listing defaults (page size, search debounce)
//! - The request timeout

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StorefrontError};
use crate::filter::DEFAULT_PAGE_SIZE;

/// Environment variable pointing at an alternate config file
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG";
pub const API_URL_ENV: &str = "STOREFRONT_API_URL";
pub const TOKEN_ENV: &str = "STOREFRONT_TOKEN";

/// Keys accepted by [`Config::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "api_url",
    "auth.token",
    "page_size",
    "search_debounce_ms",
    "request_timeout",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL (default: http://localhost:3000)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Authentication
    #[serde(default, skip_serializing_if = "AuthConfig::is_empty")]
    pub auth: AuthConfig,

    /// Items per page (default: 12)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiet period before search text is applied, in milliseconds (default: 500)
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth: AuthConfig::default(),
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("AuthConfig").field("token", &token).finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(".storefront").join("config.yaml"),
        }
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            StorefrontError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StorefrontError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| {
            StorefrontError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // Owner read/write only, the file may hold a token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, permissions).map_err(|e| {
                StorefrontError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to set permissions on config at {}: {}",
                        path.display(),
                        e
                    ),
                ))
            })?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(StorefrontError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }
        Url::parse(&self.api_url)
            .map_err(|e| StorefrontError::Config(format!("invalid api_url '{}': {e}", self.api_url)))?;
        Ok(())
    }

    /// Get the API base URL from the environment or config file
    pub fn api_url(&self) -> Result<Url> {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return Ok(Url::parse(&url)?);
        }

        Ok(Url::parse(&self.api_url)?)
    }

    /// Get the bearer token from the environment or config file
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.auth.token.clone()
    }

    pub fn set_token(&mut self, token: String) {
        self.auth.token = Some(token);
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Set a value by its dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => {
                Url::parse(value).map_err(|e| {
                    StorefrontError::Config(format!("invalid api_url '{value}': {e}"))
                })?;
                self.api_url = value.to_string();
            }
            "auth.token" => self.set_token(value.to_string()),
            "page_size" => {
                let size = parse_number::<u32>(key, value)?;
                if size == 0 {
                    return Err(StorefrontError::Config(
                        "page_size must be at least 1".to_string(),
                    ));
                }
                self.page_size = size;
            }
            "search_debounce_ms" => self.search_debounce_ms = parse_number(key, value)?,
            "request_timeout" => self.request_timeout = parse_number(key, value)?,
            _ => {
                return Err(StorefrontError::Config(format!(
                    "unknown config key '{key}'. Valid keys: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StorefrontError::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}
