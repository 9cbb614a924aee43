// src/config.rs
// =============================================================================
// Runtime configuration for the traversal engine and the HTTP retriever.
//
// There are no config files: the CLI maps its flags onto these structs, and
// library users build them directly with the `with_*` methods.
// =============================================================================

use crate::error::ConfigError;
use std::time::Duration;

/// Default number of link hops followed from the root
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Default per-request timeout for the HTTP retriever
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of redirects reqwest will follow
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// How far and how wide a traversal may go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Nodes at this distance from the root are claimed but never fetched.
    /// 0 means even the root is only claimed.
    pub max_depth: usize,

    /// Upper bound on retriever calls in flight at once. `None` = unbounded.
    /// Only retrieval is throttled; tasks waiting on children hold no permit.
    pub max_concurrent_fetches: Option<usize>,
}

impl TraversalConfig {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            max_concurrent_fetches: None,
        }
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_fetches == Some(0) {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Settings for [`crate::fetch::HttpRetriever`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
    /// When set, only links whose host equals this value become edges
    pub allowed_host: Option<String>,
}

impl HttpConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn restrict_to_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_host = Some(host.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: concat!("fanout-crawler/", env!("CARGO_PKG_VERSION")).to_string(),
            allowed_host: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_traversal_is_unbounded() {
        let config = TraversalConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_concurrent_fetches, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = TraversalConfig::new(2).with_concurrency_limit(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroConcurrency)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = HttpConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_restrict_to_host() {
        let config = HttpConfig::default().restrict_to_host("example.com");
        assert_eq!(config.allowed_host.as_deref(), Some("example.com"));
        assert!(config.user_agent.starts_with("fanout-crawler/"));
    }
}
