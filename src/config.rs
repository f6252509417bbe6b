//! Configuration types
//!
//! Pager and HTTP settings, loadable from a YAML or JSON file.
//!
//! ```yaml
//! base_url: https://api.example.com/v3
//! entity: item
//! http:
//!   timeout_secs: 20
//!   requests_per_second: 10
//! pager:
//!   count_lanes: 5
//!   cursor_key: p
//!   max_attempts: 30
//!   delay_seconds: 30
//!   query_params:
//!     category_id: "12"
//! ```

use crate::engine::RetryPolicy;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::StringMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Pager Config
// ============================================================================

/// Lane and retry settings for one traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerConfig {
    /// Number of concurrent lanes
    #[serde(default = "default_count_lanes")]
    pub count_lanes: usize,

    /// Query parameter carrying the page cursor; `None` forces a single lane
    #[serde(default = "default_cursor_key")]
    pub cursor_key: Option<String>,

    /// Attempts per round before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between attempts
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    /// Query parameters sent with every lane request
    #[serde(default)]
    pub query_params: StringMap,
}

fn default_count_lanes() -> usize {
    5
}

#[allow(clippy::unnecessary_wraps)]
fn default_cursor_key() -> Option<String> {
    Some("p".to_string())
}

fn default_max_attempts() -> u32 {
    30
}

fn default_delay_seconds() -> u64 {
    30
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            count_lanes: default_count_lanes(),
            cursor_key: default_cursor_key(),
            max_attempts: default_max_attempts(),
            delay_seconds: default_delay_seconds(),
            query_params: StringMap::new(),
        }
    }
}

impl PagerConfig {
    /// Create a new pager config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of lanes
    #[must_use]
    pub fn with_count_lanes(mut self, count: usize) -> Self {
        self.count_lanes = count;
        self
    }

    /// Set the cursor parameter name
    #[must_use]
    pub fn with_cursor_key(mut self, key: impl Into<String>) -> Self {
        self.cursor_key = Some(key.into());
        self
    }

    /// Disable the cursor, forcing a single unpaginated lane
    #[must_use]
    pub fn without_cursor(mut self) -> Self {
        self.cursor_key = None;
        self
    }

    /// Set attempts per round
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the wait between attempts
    #[must_use]
    pub fn with_delay_seconds(mut self, seconds: u64) -> Self {
        self.delay_seconds = seconds;
        self
    }

    /// Add a query parameter sent with every request
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Retry policy for rounds
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_seconds))
    }

    /// Check values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.count_lanes == 0 {
            return Err(Error::invalid_value(
                "count_lanes",
                "must be at least 1",
            ));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_value(
                "max_attempts",
                "must be at least 1",
            ));
        }
        if matches!(&self.cursor_key, Some(key) if key.trim().is_empty()) {
            return Err(Error::invalid_value(
                "cursor_key",
                "must not be empty; use null to disable lanes",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP transport settings as they appear in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Rate limit; unlimited when absent
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Burst size for the rate limiter; defaults to one full round
    #[serde(default)]
    pub burst_size: Option<u32>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            requests_per_second: None,
            burst_size: None,
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

impl HttpSettings {
    /// Build the transport config for a base URL and lane count
    pub fn to_client_config(&self, base_url: &str, count_lanes: usize) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(rps) = self.requests_per_second {
            let budget = match self.burst_size {
                Some(burst) => RateLimiterConfig::new(rps, burst),
                None => RateLimiterConfig::for_lanes(rps, count_lanes),
            };
            builder = builder.rate_limit(budget);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }
}

// ============================================================================
// App Config
// ============================================================================

/// Complete configuration loaded from a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the API
    pub base_url: String,

    /// Entity to iterate when none is given on the command line
    #[serde(default)]
    pub entity: Option<String>,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Lane and retry settings
    #[serde(default)]
    pub pager: PagerConfig,
}

impl AppConfig {
    /// Parse from a YAML (or JSON) string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Transport config for this API and lane count
    pub fn client_config(&self) -> HttpClientConfig {
        self.http.to_client_config(&self.base_url, self.pager.count_lanes)
    }

    /// Validate the whole config
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::invalid_value("base_url", "must not be empty"));
        }
        url::Url::parse(&self.base_url)?;
        self.pager.validate()
    }
}

/// Load configuration from a YAML or JSON file
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    AppConfig::parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_pager_config_defaults() {
        let config = PagerConfig::default();
        assert_eq!(config.count_lanes, 5);
        assert_eq!(config.cursor_key.as_deref(), Some("p"));
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.delay_seconds, 30);
        assert!(config.query_params.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pager_config_builder() {
        let config = PagerConfig::new()
            .with_count_lanes(3)
            .with_cursor_key("page")
            .with_max_attempts(4)
            .with_delay_seconds(2)
            .with_query_param("category_id", "7");

        assert_eq!(config.count_lanes, 3);
        assert_eq!(config.cursor_key.as_deref(), Some("page"));
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(4, Duration::from_secs(2))
        );
        assert_eq!(
            config.query_params.get("category_id"),
            Some(&"7".to_string())
        );
    }

    #[test]
    fn test_pager_config_validation() {
        assert!(PagerConfig::new().with_count_lanes(0).validate().is_err());
        assert!(PagerConfig::new().with_max_attempts(0).validate().is_err());
        assert!(PagerConfig::new().with_cursor_key(" ").validate().is_err());
        assert!(PagerConfig::new().without_cursor().validate().is_ok());
    }

    #[test]
    fn test_app_config_from_yaml() {
        let yaml = r#"
base_url: https://api.example.com/v3
entity: item
http:
  timeout_secs: 5
  requests_per_second: 20
  headers:
    Authorization: Bearer abc
pager:
  count_lanes: 3
  delay_seconds: 1
  query_params:
    category_id: "12"
"#;
        let config = AppConfig::parse(yaml).unwrap();

        assert_eq!(config.entity.as_deref(), Some("item"));
        assert_eq!(config.pager.count_lanes, 3);
        assert_eq!(config.pager.max_attempts, 30);
        assert_eq!(config.pager.cursor_key.as_deref(), Some("p"));

        let client = config.client_config();
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.rate_limit, Some(RateLimiterConfig::new(20, 20)));
        assert_eq!(
            client.default_headers.get("Authorization"),
            Some(&"Bearer abc".to_string())
        );
    }

    #[test]
    fn test_rate_limit_burst_defaults_to_lane_count() {
        let settings = HttpSettings {
            requests_per_second: Some(2),
            ..HttpSettings::default()
        };
        let client = settings.to_client_config("https://api.example.com", 8);
        assert_eq!(client.rate_limit, Some(RateLimiterConfig::new(2, 8)));

        let settings = HttpSettings {
            burst_size: Some(1),
            ..settings
        };
        let client = settings.to_client_config("https://api.example.com", 8);
        assert_eq!(client.rate_limit, Some(RateLimiterConfig::new(2, 1)));
    }

    #[test]
    fn test_null_cursor_key_disables_lanes() {
        let yaml = "base_url: https://api.example.com\npager:\n  cursor_key: null\n";
        let config = AppConfig::parse(yaml).unwrap();
        assert_eq!(config.pager.cursor_key, None);
    }

    #[test]
    fn test_app_config_from_json() {
        let json = r#"{"base_url": "https://api.example.com", "pager": {"count_lanes": 2}}"#;
        let config = AppConfig::parse(json).unwrap();
        assert_eq!(config.pager.count_lanes, 2);
        assert_eq!(config.http, HttpSettings::default());
    }

    #[test]
    fn test_app_config_rejects_invalid() {
        assert!(AppConfig::parse("base_url: ''").is_err());
        assert!(AppConfig::parse("base_url: not a url").is_err());
        assert!(
            AppConfig::parse("base_url: https://x.io\npager:\n  count_lanes: 0\n").is_err()
        );
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: https://api.example.com").unwrap();
        writeln!(file, "entity: category").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.entity.as_deref(), Some("category"));
        assert_eq!(config.pager, PagerConfig::default());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/lanepager.yaml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
