//! Search configuration

use crate::search::error::SearchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Time-to-live of cached search results
    pub cache_ttl: Duration,

    /// Number of visible members sampled for suggestions
    pub suggestion_sample_size: usize,

    /// Maximum suggestions returned
    pub max_suggestions: usize,

    /// Minimum trimmed input length before suggestions are produced
    pub min_suggestion_chars: usize,

    /// Entries kept per company / role facet list
    pub facet_top_n: usize,

    /// Page size when a query carries no pagination
    pub default_limit: usize,

    /// Upper bound applied to any requested page size
    pub max_limit: usize,

    /// Enable query suggestions
    pub enable_suggestions: bool,

    /// Enable faceted search
    pub enable_facets: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            suggestion_sample_size: 100,
            max_suggestions: 5,
            min_suggestion_chars: 2,
            facet_top_n: 10,
            default_limit: 20,
            max_limit: 100,
            enable_suggestions: true,
            enable_facets: true,
        }
    }
}

impl SearchConfig {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.cache_ttl.is_zero() {
            return Err(SearchError::InvalidConfiguration(
                "cache_ttl must be greater than zero".to_string(),
            ));
        }
        if self.suggestion_sample_size == 0 {
            return Err(SearchError::InvalidConfiguration(
                "suggestion_sample_size must be greater than zero".to_string(),
            ));
        }
        if self.default_limit == 0 {
            return Err(SearchError::InvalidConfiguration(
                "default_limit must be greater than zero".to_string(),
            ));
        }
        if self.max_limit < self.default_limit {
            return Err(SearchError::InvalidConfiguration(format!(
                "max_limit ({}) must be at least default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }
        Ok(())
    }
}

impl From<&crate::config::SearchSettings> for SearchConfig {
    fn from(settings: &crate::config::SearchSettings) -> Self {
        Self {
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            suggestion_sample_size: settings.suggestion_sample_size,
            max_suggestions: settings.max_suggestions,
            min_suggestion_chars: settings.min_suggestion_chars,
            facet_top_n: settings.facet_top_n,
            default_limit: settings.default_limit,
            max_limit: settings.max_limit,
            enable_suggestions: settings.enable_suggestions,
            enable_facets: settings.enable_facets,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn suggestion_sample_size(mut self, size: usize) -> Self {
        self.config.suggestion_sample_size = size;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.config.max_suggestions = max;
        self
    }

    pub fn min_suggestion_chars(mut self, chars: usize) -> Self {
        self.config.min_suggestion_chars = chars;
        self
    }

    pub fn facet_top_n(mut self, top_n: usize) -> Self {
        self.config.facet_top_n = top_n;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn max_limit(mut self, limit: usize) -> Self {
        self.config.max_limit = limit;
        self
    }

    pub fn enable_suggestions(mut self, enabled: bool) -> Self {
        self.config.enable_suggestions = enabled;
        self
    }

    pub fn enable_facets(mut self, enabled: bool) -> Self {
        self.config.enable_facets = enabled;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
