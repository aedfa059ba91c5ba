//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML config file (`--config PATH`, or `config.toml` in the platform
//!    config directory)
//! 3. Environment variables prefixed with `IDDEDUP_` (e.g. `IDDEDUP_WORKERS=4`)
//! 4. Command-line flags, applied by the caller
//!
//! # Example
//!
//! ```no_run
//! use iddedup::config::Config;
//!
//! let config = Config::load(None);
//! println!("{} workers, {} attempts", config.workers, config.max_attempts);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::delete::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF};
use crate::actions::resolve::DEFAULT_DISCARD_EXTENSIONS;
use crate::pool::DEFAULT_WORKERS;
use crate::scanner::policy::{DEFAULT_DELIMITER, DEFAULT_MIN_TOKEN_LEN};
use crate::scanner::PolicyKind;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "IDDEDUP_";

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The worker pool needs at least one thread.
    #[error("workers must be at least 1")]
    NoWorkers,
    /// Every deletion needs at least one attempt.
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    /// The identifier policy cannot split on an empty delimiter.
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    /// A zero minimum would select index 1 unconditionally.
    #[error("min_token_len must be at least 1")]
    ZeroTokenLen,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads shared by the scanner and size comparator.
    pub workers: usize,
    /// Deletion attempts per path before giving up on permission faults.
    pub max_attempts: u32,
    /// Pause between deletion attempts, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Grouping policy for discovered files.
    pub policy: PolicyKind,
    /// Token delimiter for the identifier policy.
    pub delimiter: String,
    /// Minimum identifier token length for the identifier policy.
    pub min_token_len: usize,
    /// Extensions deleted outright during date resolution.
    pub discard_extensions: Vec<String>,
    /// Where to write the scan snapshot, if anywhere.
    pub snapshot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF.as_millis() as u64,
            policy: PolicyKind::default(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            discard_extensions: DEFAULT_DISCARD_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            snapshot: None,
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults on any error.
    ///
    /// Uses `path` if given, otherwise the platform config file.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        match Self::figment(path.as_deref()).extract::<Self>() {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    log::warn!("Invalid configuration ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Build the layered figment: defaults, then `path` if given, then env.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "iddedup", "iddedup")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check that values are usable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if self.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        if self.min_token_len == 0 {
            return Err(ConfigError::ZeroTokenLen);
        }
        Ok(())
    }

    /// Retry policy for the resolution engine.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }
}
