//! Specification provider configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Published location of the OSI core specification
pub const DEFAULT_SPEC_URL: &str =
    "https://raw.githubusercontent.com/open-semantic-interchange/OSI/main/core-spec/spec.yaml";

/// Specification provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsiSpecConfig {
    /// URL of the published specification
    pub url: String,
    /// Fetch timeout in seconds
    pub timeout_secs: u64,
    /// Cache time-to-live in seconds
    pub ttl_secs: u64,
    /// Skip the network and always use the bundled copy
    pub offline: bool,
}

impl OsiSpecConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With specification URL
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// With offline mode
    #[inline]
    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Fetch timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache time-to-live
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for OsiSpecConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SPEC_URL.to_string(),
            timeout_secs: 10,
            ttl_secs: 3600,
            offline: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_limits() {
        let config = OsiSpecConfig::new();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.ttl(), Duration::from_secs(60 * 60));
        assert!(!config.offline);
    }

    #[test]
    fn builder_overrides() {
        let config = OsiSpecConfig::new()
            .with_url("http://localhost/spec.yaml")
            .with_offline(true);
        assert_eq!(config.url, "http://localhost/spec.yaml");
        assert!(config.offline);
    }
}
