use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (default: `http://localhost:8001`).
    pub api_url: Url,
    /// File holding the persisted bearer token.
    pub token_path: PathBuf,
    /// Seconds between notification polls (default: `30`).
    pub poll_interval_secs: u64,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

const DEFAULT_API_URL: &str = "http://localhost:8001";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                    |
    /// |------------------------------|----------------------------|
    /// | `DOORS_API_URL`              | `http://localhost:8001`    |
    /// | `DOORS_TOKEN_PATH`           | `$HOME/.doors/token`       |
    /// | `DOORS_POLL_INTERVAL_SECS`   | `30`                       |
    /// | `DOORS_REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(
            "DOORS_API_URL",
            &lookup("DOORS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
        )?;

        let token_path = lookup("DOORS_TOKEN_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_token_path(lookup("HOME")));

        let poll_interval_secs = parse_secs(
            "DOORS_POLL_INTERVAL_SECS",
            lookup("DOORS_POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?;

        let request_timeout_secs = parse_secs(
            "DOORS_REQUEST_TIMEOUT_SECS",
            lookup("DOORS_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_url,
            token_path,
            poll_interval_secs,
            request_timeout_secs,
        })
    }

    /// Override the backend URL (from the `--api-url` flag).
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url("--api-url", raw)?;
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_api_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::Invalid {
        var,
        expected: "an absolute http(s) URL",
        value: raw.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

/// Positive whole seconds. `tokio::time::interval` panics on zero.
fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive number of seconds",
            value: raw,
        }),
    }
}

fn default_token_path(home: Option<String>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(".doors").join("token"),
        None => PathBuf::from(".doors-token"),
    }
}
