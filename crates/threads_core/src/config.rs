//! Environment-driven configuration.
//!
//! All values are read once at startup by the caller and passed down
//! explicitly; nothing in core reads the environment on its own except
//! [`DatabaseConfig::from_env`] / [`AppConfig::from_env`].

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DATABASE_URL_ENV: &str = "THREADS_DATABASE_URL";
pub const LOG_LEVEL_ENV: &str = "THREADS_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "THREADS_LOG_DIR";
pub const PAGE_SIZE_ENV: &str = "THREADS_PAGE_SIZE";

const DEFAULT_LOG_DIR_NAME: &str = "threads-logs";
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Store connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection string. `None` means degraded mode: no store is opened.
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: non_empty(lookup(DATABASE_URL_ENV)),
        }
    }
}

/// Process-level settings used by executables embedding the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub page_size: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Builds config from an arbitrary key lookup; missing or unparsable
    /// values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_level = non_empty(lookup(LOG_LEVEL_ENV))
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = non_empty(lookup(LOG_DIR_ENV))
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));
        let page_size = non_empty(lookup(PAGE_SIZE_ENV))
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            database: DatabaseConfig::from_lookup(&lookup),
            log_level,
            log_dir,
            page_size,
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DatabaseConfig, DATABASE_URL_ENV, LOG_DIR_ENV, PAGE_SIZE_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn blank_database_url_means_degraded_mode() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[(DATABASE_URL_ENV, "   ")]));
        assert_eq!(config.url, None);
    }

    #[test]
    fn app_config_reads_values_and_trims() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_ENV, " sqlite:///tmp/threads.db "),
            (LOG_DIR_ENV, "/var/log/threads"),
            (PAGE_SIZE_ENV, "50"),
        ]));
        assert_eq!(config.database.url.as_deref(), Some("sqlite:///tmp/threads.db"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/threads"));
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn app_config_falls_back_on_invalid_page_size() {
        let config = AppConfig::from_lookup(lookup_from(&[(PAGE_SIZE_ENV, "0")]));
        assert_eq!(config.page_size, 20);

        let config = AppConfig::from_lookup(lookup_from(&[(PAGE_SIZE_ENV, "many")]));
        assert_eq!(config.page_size, 20);
    }
}
