use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("session expired or missing, please log in again")]
    Unauthorized,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("controller has shut down")]
    ControllerClosed,
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
