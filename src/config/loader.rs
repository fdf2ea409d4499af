//! Configuration file loading with precedence handling.

use crate::timeline::cache::EvictionPolicy;
use crate::timeline::cell::SettlePolicy;
use crate::timeline::manager::TimelineOptions;
use crate::timeline::resize::ResizeOptions;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "VTIMELINE_CONFIG";

/// Environment variable selecting the startup category.
pub const CATEGORY_ENV_VAR: &str = "VTIMELINE_CATEGORY";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/vtimeline/config.toml`. Heights and margins
/// are in terminal rows.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Rows kept mounted above and below the viewport.
    #[serde(default)]
    pub overscan: Option<u32>,

    /// Posts per page while scrolling.
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Posts in the first page.
    #[serde(default)]
    pub first_page_size: Option<usize>,

    /// Feed length assumed for scroll-height padding.
    #[serde(default)]
    pub assumed_total_count: Option<usize>,

    /// Resize debounce window in milliseconds.
    #[serde(default)]
    pub resize_debounce_ms: Option<u64>,

    /// Smallest height change worth reporting.
    #[serde(default)]
    pub resize_threshold: Option<u32>,

    /// Height settle retries for new cells.
    #[serde(default)]
    pub settle_retries: Option<u32>,

    /// Wait between settle samples in milliseconds.
    #[serde(default)]
    pub settle_interval_ms: Option<u64>,

    /// Largest sample difference that counts as settled.
    #[serde(default)]
    pub settle_epsilon: Option<u32>,

    /// Capacity of the post lookup cache.
    #[serde(default)]
    pub cache_capacity: Option<usize>,

    /// Eviction policy of the post lookup cache (`lru` or `insertion`).
    #[serde(default)]
    pub cache_policy: Option<EvictionPolicy>,

    /// Category shown at startup.
    #[serde(default)]
    pub category: Option<String>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Overscan margin in rows.
    pub overscan: u32,
    /// Page size.
    pub page_size: usize,
    /// First page size.
    pub first_page_size: usize,
    /// Assumed feed length.
    pub assumed_total_count: usize,
    /// Resize debounce window in milliseconds.
    pub resize_debounce_ms: u64,
    /// Resize noise threshold in rows.
    pub resize_threshold: u32,
    /// Settle retries.
    pub settle_retries: u32,
    /// Settle interval in milliseconds.
    pub settle_interval_ms: u64,
    /// Settle epsilon in rows.
    pub settle_epsilon: u32,
    /// Post cache capacity.
    pub cache_capacity: usize,
    /// Post cache eviction policy.
    pub cache_policy: EvictionPolicy,
    /// Startup category; `None` shows every post.
    pub category: Option<String>,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            overscan: 20,
            page_size: 10,
            first_page_size: 10,
            assumed_total_count: 100,
            resize_debounce_ms: 20,
            // A one-row change is significant on a terminal
            resize_threshold: 1,
            // Terminal text lays out synchronously
            settle_retries: 0,
            settle_interval_ms: 20,
            settle_epsilon: 0,
            cache_capacity: 256,
            cache_policy: EvictionPolicy::Lru,
            category: None,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Engine options derived from this configuration.
    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            page_size: self.page_size,
            first_page_size: self.first_page_size,
            assumed_total_count: self.assumed_total_count,
            settle: SettlePolicy {
                retries: self.settle_retries,
                interval: Duration::from_millis(self.settle_interval_ms),
                epsilon: self.settle_epsilon,
            },
            resize: ResizeOptions {
                debounce: Duration::from_millis(self.resize_debounce_ms),
                threshold: self.resize_threshold,
            },
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/vtimeline/vtimeline.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("vtimeline").join("vtimeline.log")
    } else {
        PathBuf::from("vtimeline.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/vtimeline/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vtimeline").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `VTIMELINE_CONFIG` environment variable
/// 3. Default path `~/.config/vtimeline/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `VTIMELINE_CATEGORY`: startup category (empty string means all posts)
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(category) = std::env::var(CATEGORY_ENV_VAR) {
        config.category = (!category.is_empty()).then_some(category);
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        overscan: config.overscan.unwrap_or(defaults.overscan),
        page_size: config.page_size.unwrap_or(defaults.page_size),
        first_page_size: config.first_page_size.unwrap_or(defaults.first_page_size),
        assumed_total_count: config
            .assumed_total_count
            .unwrap_or(defaults.assumed_total_count),
        resize_debounce_ms: config
            .resize_debounce_ms
            .unwrap_or(defaults.resize_debounce_ms),
        resize_threshold: config.resize_threshold.unwrap_or(defaults.resize_threshold),
        settle_retries: config.settle_retries.unwrap_or(defaults.settle_retries),
        settle_interval_ms: config
            .settle_interval_ms
            .unwrap_or(defaults.settle_interval_ms),
        settle_epsilon: config.settle_epsilon.unwrap_or(defaults.settle_epsilon),
        cache_capacity: config.cache_capacity.unwrap_or(defaults.cache_capacity),
        cache_policy: config.cache_policy.unwrap_or(defaults.cache_policy),
        category: config.category.or(defaults.category),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    category_override: Option<String>,
    overscan_override: Option<u32>,
    page_size_override: Option<usize>,
) -> ResolvedConfig {
    if let Some(category) = category_override {
        config.category = Some(category);
    }

    if let Some(overscan) = overscan_override {
        config.overscan = overscan;
    }

    if let Some(page_size) = page_size_override {
        config.page_size = page_size;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
