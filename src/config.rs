//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable values fall back
//! to defaults; only the API base URL is validated strictly because every
//! other address (REST and WebSocket) is derived from it.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::domain::ledger::DEFAULT_INITIAL_BANK_BALANCE;
use crate::error::ClientError;
use crate::sync::backoff::BackoffPolicy;

/// Default REST base URL when `API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL (e.g. `http://localhost:8080`). The event stream URL
    /// is derived from it.
    pub api_base_url: Url,

    /// Bank reserves before any transaction. Seeds the bank balance fold.
    pub initial_bank_balance: i64,

    /// Reconnect policy for the event stream.
    pub backoff: BackoffPolicy,

    /// Capacity of the [`crate::sync::UpdateBus`] broadcast channel.
    pub event_bus_capacity: usize,

    /// Per-request REST timeout. `None` means requests never time out.
    pub http_timeout: Option<Duration>,

    /// Where the auth session is persisted between runs, if anywhere.
    pub session_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Creates a configuration for the given API base URL with every other
    /// setting at its default.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            initial_bank_balance: DEFAULT_INITIAL_BANK_BALANCE,
            backoff: BackoffPolicy::default(),
            event_bus_capacity: 1024,
            http_timeout: None,
            session_file: None,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if `API_BASE_URL` is set but is
    /// not an absolute `http`/`https` URL.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_api_base_url(&api_base_url)?;

        let defaults = BackoffPolicy::default();
        let backoff = BackoffPolicy {
            enabled: parse_env_bool("RECONNECT_ENABLED", defaults.enabled),
            initial_delay: Duration::from_millis(parse_env(
                "RECONNECT_INITIAL_DELAY_MS",
                millis(defaults.initial_delay),
            )),
            max_delay: Duration::from_millis(parse_env(
                "RECONNECT_MAX_DELAY_MS",
                millis(defaults.max_delay),
            )),
            max_attempts: parse_env("RECONNECT_MAX_ATTEMPTS", defaults.max_attempts),
            jitter: parse_env("RECONNECT_JITTER", defaults.jitter).clamp(0.0, 1.0),
        };

        let http_timeout = match parse_env::<u64>("HTTP_TIMEOUT_SECS", 0) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let session_file = std::env::var("SESSION_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_base_url,
            initial_bank_balance: parse_env("INITIAL_BANK_BALANCE", DEFAULT_INITIAL_BANK_BALANCE),
            backoff,
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", 1024_usize).max(1),
            http_timeout,
            session_file,
        })
    }
}

/// Parses and validates an API base URL.
///
/// # Errors
///
/// Returns [`ClientError::InvalidConfig`] if the string is not a URL or its
/// scheme is neither `http` nor `https`.
pub fn parse_api_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ClientError::InvalidConfig(format!("API_BASE_URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidConfig(format!(
            "API_BASE_URL must be http or https, got {other}"
        ))),
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_client() {
        let Ok(url) = parse_api_base_url(DEFAULT_API_BASE_URL) else {
            panic!("default url should parse");
        };
        let config = ClientConfig::new(url);
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.initial_bank_balance, 20_580);
        assert!(config.http_timeout.is_none());
        assert!(config.session_file.is_none());
    }

    #[test]
    fn https_base_url_is_accepted() {
        let Ok(url) = parse_api_base_url("https://poly.example.com/api") else {
            panic!("https should parse");
        };
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let result = parse_api_base_url("ftp://example.com");
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn garbage_base_url_is_rejected() {
        assert!(parse_api_base_url("not a url").is_err());
    }
}
