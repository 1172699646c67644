//! Client configuration loaded from environment variables.
//!
//! Every setting has a default suitable for a local development backend,
//! so the client starts with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use campus_shared::constants::{
    DEFAULT_API_URL, DEFAULT_EVENTS_RESYNC_DELAY_MS, DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEARCH_DEBOUNCE_MS,
};

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST backend, including the `/api` prefix.
    /// Env: `CAMPUS_API_URL`
    /// Default: `http://localhost:5000/api`
    pub api_url: String,

    /// Explicit database file. `None` uses the platform data directory.
    /// Env: `CAMPUS_DB_PATH`
    pub db_path: Option<PathBuf>,

    /// Per-request timeout. A timed-out request counts as unreachable.
    /// Env: `CAMPUS_REQUEST_TIMEOUT_SECS`
    /// Default: 30 s
    pub request_timeout: Duration,

    /// Posts requested per feed page.
    /// Env: `CAMPUS_PAGE_SIZE`
    /// Default: 20
    pub page_size: u32,

    /// Quiet period before a search-driven fetch goes out.
    /// Env: `CAMPUS_SEARCH_DEBOUNCE_MS`
    /// Default: 300 ms
    pub search_debounce: Duration,

    /// Delay between an events sync-back pass and the follow-up refetch.
    /// Env: `CAMPUS_EVENTS_RESYNC_DELAY_MS`
    /// Default: 2000 ms
    pub events_resync_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            db_path: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            events_resync_delay: Duration::from_millis(DEFAULT_EVENTS_RESYNC_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CAMPUS_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid CAMPUS_API_URL, using default");
            }
        }

        if let Some(path) = lookup("CAMPUS_DB_PATH") {
            if !path.trim().is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(secs) = parse_positive(&lookup, "CAMPUS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(size) = parse_positive(&lookup, "CAMPUS_PAGE_SIZE") {
            match u32::try_from(size) {
                Ok(size) => config.page_size = size,
                Err(_) => tracing::warn!(value = size, "CAMPUS_PAGE_SIZE out of range, using default"),
            }
        }

        if let Some(ms) = parse_positive(&lookup, "CAMPUS_SEARCH_DEBOUNCE_MS") {
            config.search_debounce = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_positive(&lookup, "CAMPUS_EVENTS_RESYNC_DELAY_MS") {
            config.events_resync_delay = Duration::from_millis(ms);
        }

        config
    }
}

fn parse_positive<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(ClientConfig::from_lookup(|_| None), ClientConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAMPUS_API_URL", "https://campus.example.edu/api/"),
            ("CAMPUS_DB_PATH", "/tmp/campus.db"),
            ("CAMPUS_REQUEST_TIMEOUT_SECS", "5"),
            ("CAMPUS_PAGE_SIZE", "50"),
            ("CAMPUS_SEARCH_DEBOUNCE_MS", "100"),
            ("CAMPUS_EVENTS_RESYNC_DELAY_MS", "10"),
        ]));

        assert_eq!(config.api_url, "https://campus.example.edu/api");
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/campus.db")));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.search_debounce, Duration::from_millis(100));
        assert_eq!(config.events_resync_delay, Duration::from_millis(10));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CAMPUS_API_URL", "localhost:5000"),
            ("CAMPUS_PAGE_SIZE", "zero"),
            ("CAMPUS_REQUEST_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }
}
