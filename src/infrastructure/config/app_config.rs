//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::infrastructure::image::ImageCacheConfig;
use crate::infrastructure::net::RetryPolicy;

const APP_NAME: &str = "rwitt";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "rwitt";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, from file and CLI.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Post store file path; defaults to the project data directory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Image cache configuration.
    #[serde(default)]
    pub cache: CacheSection,

    /// Timeline window configuration.
    #[serde(default)]
    pub timeline: TimelineSection,
}

/// Image cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Number of concurrent download workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the bounded request queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Bound on installed in-memory entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Download attempts before a request is dropped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay in milliseconds before the first retry; doubles per attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Image directory; defaults to the project cache directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            max_entries: default_max_entries(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            dir: None,
        }
    }
}

/// Timeline window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSection {
    /// Window bound on each side of the scroll cursor.
    #[serde(default = "default_max_per_side")]
    pub max_per_side: usize,

    /// How many stored posts to load at startup.
    #[serde(default = "default_preload")]
    pub preload: usize,
}

impl Default for TimelineSection {
    fn default() -> Self {
        Self {
            max_per_side: default_max_per_side(),
            preload: default_preload(),
        }
    }
}

fn default_workers() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    20
}

fn default_max_entries() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_per_side() -> usize {
    10
}

fn default_preload() -> usize {
    20
}

use super::args::CliArgs;

impl AppConfig {
    /// Loads the configuration file if one exists, otherwise defaults.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.or_else(Self::default_config_path);
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).wrap_err("failed to read config file")?;
        let mut config: Self = toml::from_str(&content).wrap_err("failed to parse config file")?;
        config.config = Some(path);
        Ok(config)
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(cache_dir) = args.cache_dir {
            self.cache.dir = Some(cache_dir);
        }
        if let Some(store_path) = args.store_path {
            self.store_path = Some(store_path);
        }
        if let Some(workers) = args.workers {
            self.cache.workers = workers;
        }
        if let Some(preload) = args.preload {
            self.timeline.preload = preload;
        }
    }

    /// Builds the image cache configuration from the cache section.
    #[must_use]
    pub fn image_cache_config(&self) -> ImageCacheConfig {
        let defaults = ImageCacheConfig::default();
        ImageCacheConfig {
            workers: self.cache.workers,
            queue_capacity: self.cache.queue_capacity,
            max_entries: self.cache.max_entries,
            retry: self.retry_policy(),
            request_timeout: Duration::from_secs(self.cache.request_timeout_secs),
            cache_dir: self.cache.dir.clone().unwrap_or(defaults.cache_dir),
        }
    }

    /// Builds the shared retry policy from the cache section.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.cache.max_attempts,
            Duration::from_millis(self.cache.initial_backoff_ms),
        )
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("rwitt.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_with_sections() {
        let toml_content = r#"
            log_level = "debug"

            [cache]
            workers = 8
            max_entries = 32

            [timeline]
            max_per_side = 25
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.cache.workers, 8);
        assert_eq!(config.cache.max_entries, 32);
        // Untouched fields keep their defaults.
        assert_eq!(config.cache.queue_capacity, 20);
        assert_eq!(config.timeline.max_per_side, 25);
        assert_eq!(config.timeline.preload, 20);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.cache.workers, 5);
        assert_eq!(config.cache.queue_capacity, 20);
        assert_eq!(config.cache.max_attempts, 3);
        assert_eq!(config.timeline.max_per_side, 10);
    }

    #[test]
    fn test_retry_policy_from_cache_section() {
        let mut config = AppConfig::default();
        config.cache.max_attempts = 5;
        config.cache.initial_backoff_ms = 250;

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
    }
}
