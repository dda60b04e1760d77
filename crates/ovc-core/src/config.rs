//! Browser configuration.
//!
//! Values come from [`crate::defaults`] and can be overridden through the
//! environment (a `.env` file is honored by [`BrowserConfig::load`]):
//!
//! - `OVC_PAGE_SIZE`: rows per page (default: 50; invalid values fall back)
//! - `OVC_DEFAULT_SORT`: `field[:asc|desc]` (default: `checkout_time:desc`)
//! - `OVC_STATUS_TTL_MS`: status message lifetime (default: 2000)
//! - `OVC_SORT_STATUS_TTL_MS`: sort confirmation lifetime (default: 1500)
//! - `OVC_USER`: current user; falls back to `USER` / `USERNAME`

use std::time::Duration;

use tracing::{debug, warn};

use crate::defaults;
use crate::error::{Error, Result};
use crate::search::SortSpec;

/// Runtime configuration for an object browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Rows per page.
    pub page_size: usize,
    /// Sort applied before the user picks one.
    pub default_sort: SortSpec,
    /// Lifetime of completion and error messages.
    pub status_ttl: Duration,
    /// Lifetime of sort confirmations.
    pub sort_status_ttl: Duration,
    /// Identifier of the user operating the browser, uppercased.
    pub current_user: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            default_sort: defaults::SORT,
            status_ttl: Duration::from_millis(defaults::STATUS_TTL_MS),
            sort_status_ttl: Duration::from_millis(defaults::SORT_STATUS_TTL_MS),
            current_user: defaults::UNKNOWN_USER.to_string(),
        }
    }
}

impl BrowserConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` (if present), then read the environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("OVC_PAGE_SIZE") {
            config.page_size = parse_page_size(&raw);
        }

        if let Some(raw) = lookup("OVC_DEFAULT_SORT") {
            match raw.parse::<SortSpec>() {
                Ok(sort) => config.default_sort = sort,
                Err(e) => warn!(error = %e, "Invalid OVC_DEFAULT_SORT, using default"),
            }
        }

        if let Some(ms) =
            lookup("OVC_STATUS_TTL_MS").and_then(|v| parse_millis("OVC_STATUS_TTL_MS", &v))
        {
            config.status_ttl = ms;
        }

        if let Some(ms) = lookup("OVC_SORT_STATUS_TTL_MS")
            .and_then(|v| parse_millis("OVC_SORT_STATUS_TTL_MS", &v))
        {
            config.sort_status_ttl = ms;
        }

        if let Some(user) = lookup("OVC_USER")
            .or_else(|| lookup("USER"))
            .or_else(|| lookup("USERNAME"))
            .filter(|u| !u.trim().is_empty())
        {
            config.current_user = user.trim().to_uppercase();
        }

        config
    }

    /// Set the page size; non-positive values fall back to the default.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 {
            defaults::PAGE_SIZE
        } else {
            page_size
        };
        self
    }

    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }

    pub fn with_sort_status_ttl(mut self, ttl: Duration) -> Self {
        self.sort_status_ttl = ttl;
        self
    }

    pub fn with_current_user(mut self, user: impl Into<String>) -> Self {
        self.current_user = user.into().trim().to_uppercase();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.current_user.trim().is_empty() {
            return Err(Error::Config("current_user cannot be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Parse a user-entered page size.
///
/// Empty, unparsable, or non-positive input yields [`defaults::PAGE_SIZE`].
pub fn parse_page_size(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => n as usize,
        _ => {
            if !raw.trim().is_empty() {
                debug!(input = raw, "Invalid page size, using default");
            }
            defaults::PAGE_SIZE
        }
    }
}

fn parse_millis(key: &str, raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!(key, value = raw, "Invalid duration, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SortField;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.default_sort, SortSpec::new(SortField::CheckoutTime, false));
        assert_eq!(config.status_ttl, Duration::from_millis(2000));
        assert_eq!(config.sort_status_ttl, Duration::from_millis(1500));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = BrowserConfig::from_lookup(lookup(&[
            ("OVC_PAGE_SIZE", "25"),
            ("OVC_DEFAULT_SORT", "name:asc"),
            ("OVC_STATUS_TTL_MS", "500"),
            ("OVC_USER", " alice "),
        ]));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.default_sort, SortSpec::new(SortField::Name, true));
        assert_eq!(config.status_ttl, Duration::from_millis(500));
        assert_eq!(config.current_user, "ALICE");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = BrowserConfig::from_lookup(lookup(&[
            ("OVC_PAGE_SIZE", "-3"),
            ("OVC_DEFAULT_SORT", "size"),
            ("OVC_STATUS_TTL_MS", "soon"),
        ]));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.default_sort, SortSpec::default());
        assert_eq!(config.status_ttl, Duration::from_millis(2000));
    }

    #[test]
    fn test_user_falls_back_to_os_user() {
        let config = BrowserConfig::from_lookup(lookup(&[("USER", "bob")]));
        assert_eq!(config.current_user, "BOB");

        let config = BrowserConfig::from_lookup(lookup(&[("USERNAME", "carol")]));
        assert_eq!(config.current_user, "CAROL");
    }

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size("120"), 120);
        assert_eq!(parse_page_size(" 7 "), 7);
        assert_eq!(parse_page_size(""), 50);
        assert_eq!(parse_page_size("0"), 50);
        assert_eq!(parse_page_size("-1"), 50);
        assert_eq!(parse_page_size("lots"), 50);
    }

    #[test]
    fn test_with_page_size_zero_falls_back() {
        assert_eq!(BrowserConfig::new().with_page_size(0).page_size, 50);
        assert_eq!(BrowserConfig::new().with_page_size(10).page_size, 10);
    }

    #[test]
    fn test_validate_rejects_empty_user() {
        let config = BrowserConfig::new().with_current_user("  ");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(BrowserConfig::new().with_current_user("dave").validate().is_ok());
    }
}
