use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// Environment variable naming an override config file
pub const CONFIG_PATH_ENV: &str = "PINBOARD_SEARCH_CONFIG";

/// Config file read when no override is given
pub const DEFAULT_CONFIG_PATH: &str = "config/pinboard-search.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search service configuration
    #[serde(default)]
    pub search: SearchSettings,

    /// Member store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Search analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration, reading overrides from `config_path` if it exists
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: PINBOARD_SEARCH__)
            .add_source(
                config::Environment::with_prefix("PINBOARD_SEARCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Cached result lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Visible members sampled for suggestions
    #[serde(default = "default_suggestion_sample_size")]
    pub suggestion_sample_size: usize,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    #[serde(default = "default_min_suggestion_chars")]
    pub min_suggestion_chars: usize,

    /// Entries kept per company / role facet list
    #[serde(default = "default_facet_top_n")]
    pub facet_top_n: usize,

    #[serde(default = "default_limit")]
    pub default_limit: usize,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    #[serde(default = "default_true")]
    pub enable_facets: bool,

    #[serde(default = "default_true")]
    pub enable_suggestions: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            suggestion_sample_size: default_suggestion_sample_size(),
            max_suggestions: default_max_suggestions(),
            min_suggestion_chars: default_min_suggestion_chars(),
            facet_top_n: default_facet_top_n(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            enable_facets: true,
            enable_suggestions: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend type
    #[serde(default)]
    pub backend: StoreBackend,

    /// Index directory (tantivy only); a RAM index is used when absent
    pub index_path: Option<PathBuf>,

    /// Tantivy writer heap budget in bytes
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            index_path: None,
            writer_heap_size: default_writer_heap_size(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Tantivy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Events buffered before a flush is forced
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Periodic flush interval in seconds
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_capacity: default_buffer_capacity(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_suggestion_sample_size() -> usize {
    100
}

fn default_max_suggestions() -> usize {
    5
}

fn default_min_suggestion_chars() -> usize {
    2
}

fn default_facet_top_n() -> usize {
    10
}

fn default_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

fn default_writer_heap_size() -> usize {
    50_000_000
}

fn default_buffer_capacity() -> usize {
    10
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
