//! Runtime configuration from environment variables.

use thiserror::Error;

/// Default backend address, matching the local development server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Caller identity sent as `x-user-id` when none is configured.
pub const DEFAULT_USER_ID: &str = "demo-analyst";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': must start with http:// or https://")]
    InvalidBaseUrl { url: String },
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without trailing slash.
    pub base_url: String,
    /// Caller identity attached as `x-user-id`.
    pub user_id: String,
    /// Optional bearer token attached as `Authorization`.
    pub bearer_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            bearer_token: None,
        }
    }
}

impl Config {
    /// Read configuration from `CLAUSEHOUND_BASE_URL`, `CLAUSEHOUND_USER_ID`
    /// and `CLAUSEHOUND_TOKEN`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CLAUSEHOUND_BASE_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidBaseUrl { url });
            }
            config.base_url = url;
        }
        if let Ok(user_id) = std::env::var("CLAUSEHOUND_USER_ID") {
            if !user_id.trim().is_empty() {
                config.user_id = user_id.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var("CLAUSEHOUND_TOKEN") {
            if !token.trim().is_empty() {
                config.bearer_token = Some(token.trim().to_string());
            }
        }

        Ok(config)
    }
}
