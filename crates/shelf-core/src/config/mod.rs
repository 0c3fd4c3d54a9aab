//! Runtime configuration for the catalog service and sync engine.
//!
//! Values come from `SHELF_*` environment variables with defaults matching
//! the production catalog service. Parsing goes through an injectable lookup
//! so it can be exercised without touching the process environment.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

pub const ENV_API_BASE_URL: &str = "SHELF_API_BASE_URL";
pub const ENV_CLIENT_FIELD: &str = "SHELF_CLIENT_FIELD";
pub const ENV_SUBMIT_TIMEOUT_SECS: &str = "SHELF_SUBMIT_TIMEOUT_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "SHELF_FETCH_TIMEOUT_SECS";
pub const ENV_CONNECTIVITY_INTERVAL_SECS: &str = "SHELF_CONNECTIVITY_INTERVAL_SECS";
pub const ENV_CONNECTIVITY_SETTLE_CHECKS: &str = "SHELF_CONNECTIVITY_SETTLE_CHECKS";
pub const ENV_RETENTION_DAYS: &str = "SHELF_RETENTION_DAYS";

pub const DEFAULT_API_BASE_URL: &str = "https://app.getswipe.in";
/// Value of the `field` header the catalog service expects on every request.
pub const DEFAULT_CLIENT_FIELD: &str = "swiftui2.0";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfConfig {
    /// Catalog service base URL, without trailing slash
    pub api_base_url: String,
    /// Value sent in the `field` request header
    pub client_field: String,
    pub submit_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Seconds between reachability probes
    pub connectivity_interval_secs: u64,
    /// Consecutive agreeing probes required before a transition is published
    pub connectivity_settle_checks: u32,
    /// Days to keep uploaded writes; `None` keeps them forever
    pub retention_days: Option<u64>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            client_field: DEFAULT_CLIENT_FIELD.to_string(),
            submit_timeout_secs: 30,
            fetch_timeout_secs: 15,
            connectivity_interval_secs: 5,
            connectivity_settle_checks: 2,
            retention_days: Some(30),
        }
    }
}

impl ShelfConfig {
    /// Load configuration from `SHELF_*` environment variables.
    ///
    /// Unset variables keep their defaults; malformed values are errors.
    pub fn from_env() -> Result<Self> {
        parse_config(|key| env::var(key).ok())
    }

    /// Check value ranges and normalize the base URL.
    pub fn validate(mut self) -> Result<Self> {
        self.api_base_url = normalize_base_url(&self.api_base_url)?;
        self.client_field = self.client_field.trim().to_string();
        if self.client_field.is_empty() {
            return Err(Error::InvalidInput(format!("{ENV_CLIENT_FIELD} must not be empty")));
        }
        if self.submit_timeout_secs == 0 || self.fetch_timeout_secs == 0 {
            return Err(Error::InvalidInput("request timeouts must be at least 1 second".into()));
        }
        if self.connectivity_interval_secs == 0 {
            return Err(Error::InvalidInput(format!(
                "{ENV_CONNECTIVITY_INTERVAL_SECS} must be at least 1"
            )));
        }
        if self.connectivity_settle_checks == 0 {
            return Err(Error::InvalidInput(format!(
                "{ENV_CONNECTIVITY_SETTLE_CHECKS} must be at least 1"
            )));
        }
        Ok(self)
    }

    #[must_use]
    pub const fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub const fn connectivity_interval(&self) -> Duration {
        Duration::from_secs(self.connectivity_interval_secs)
    }

    /// Retention window for uploaded writes.
    #[must_use]
    pub fn retention(&self) -> Option<Duration> {
        self.retention_days
            .map(|days| Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
    }

    /// `host:port` of the catalog service, used by the reachability probe.
    pub fn api_socket_addr(&self) -> Result<String> {
        let url = reqwest::Url::parse(&self.api_base_url)
            .map_err(|error| Error::InvalidInput(format!("invalid API base URL: {error}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidInput("API base URL has no host".into()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::InvalidInput("API base URL has no port".into()))?;
        Ok(format!("{host}:{port}"))
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<ShelfConfig> {
    let mut config = ShelfConfig::default();

    if let Some(url) = lookup_trimmed(&lookup, ENV_API_BASE_URL) {
        config.api_base_url = url;
    }
    if let Some(field) = lookup_trimmed(&lookup, ENV_CLIENT_FIELD) {
        config.client_field = field;
    }
    if let Some(value) = parse_number(&lookup, ENV_SUBMIT_TIMEOUT_SECS)? {
        config.submit_timeout_secs = value;
    }
    if let Some(value) = parse_number(&lookup, ENV_FETCH_TIMEOUT_SECS)? {
        config.fetch_timeout_secs = value;
    }
    if let Some(value) = parse_number(&lookup, ENV_CONNECTIVITY_INTERVAL_SECS)? {
        config.connectivity_interval_secs = value;
    }
    if let Some(value) = parse_number(&lookup, ENV_CONNECTIVITY_SETTLE_CHECKS)? {
        config.connectivity_settle_checks = value;
    }
    if let Some(days) = parse_number::<u64>(&lookup, ENV_RETENTION_DAYS)? {
        // 0 disables pruning
        config.retention_days = (days > 0).then_some(days);
    }

    config.validate()
}

/// Trimmed value of `key`, or `None` when it is unset or blank.
fn lookup_trimmed(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup_trimmed(lookup, key) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| Error::InvalidInput(format!("{key} must be a non-negative integer, got '{raw}'")))
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(Error::InvalidInput("API base URL must not be empty".into()));
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".into(),
        ));
    }
    Ok(base)
}
