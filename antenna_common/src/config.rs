//! Configuration loading traits and types.
//!
//! Every tracker process reads one TOML file. The state store settings
//! live under `[store]`, the common fields under `[shared]`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use antenna_common::config::{ConfigLoader, StateStoreConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = StateStoreConfig::load_validated(Path::new("config.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_CALIBRATION_QUEUE_CAPACITY, DEFAULT_CONTROL_CYCLE_US, DEFAULT_FIELDBUS_CYCLE_US,
    DEFAULT_PARAMETER_FILE, DEFAULT_WRITE_LOCK_TIMEOUT_US, MAX_CALIBRATION_SAMPLES,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all tracker processes.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "tracker-site-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// State store timing and capacity settings (`[store]` table).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    /// Bounded wait for the commit lock [µs].
    #[serde(default = "default_write_lock_timeout_us")]
    pub write_lock_timeout_us: u64,
    /// Control loop period [µs].
    #[serde(default = "default_control_cycle_us")]
    pub control_cycle_us: u64,
    /// Fieldbus I/O cycle period [µs]. Also the cross-owner staleness bound.
    #[serde(default = "default_fieldbus_cycle_us")]
    pub fieldbus_cycle_us: u64,
    /// Capacity of the pending calibration input queue.
    #[serde(default = "default_calibration_queue_capacity")]
    pub calibration_queue_capacity: usize,
    /// Where saved parameters are written.
    #[serde(default = "default_parameter_file")]
    pub parameter_file: PathBuf,
}

fn default_write_lock_timeout_us() -> u64 {
    DEFAULT_WRITE_LOCK_TIMEOUT_US
}
fn default_control_cycle_us() -> u64 {
    DEFAULT_CONTROL_CYCLE_US
}
fn default_fieldbus_cycle_us() -> u64 {
    DEFAULT_FIELDBUS_CYCLE_US
}
fn default_calibration_queue_capacity() -> usize {
    DEFAULT_CALIBRATION_QUEUE_CAPACITY
}
fn default_parameter_file() -> PathBuf {
    PathBuf::from(DEFAULT_PARAMETER_FILE)
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            write_lock_timeout_us: DEFAULT_WRITE_LOCK_TIMEOUT_US,
            control_cycle_us: DEFAULT_CONTROL_CYCLE_US,
            fieldbus_cycle_us: DEFAULT_FIELDBUS_CYCLE_US,
            calibration_queue_capacity: DEFAULT_CALIBRATION_QUEUE_CAPACITY,
            parameter_file: default_parameter_file(),
        }
    }
}

impl StoreSettings {
    /// Validate timing and capacity values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_lock_timeout_us == 0 {
            return Err(ConfigError::ValidationError(
                "write_lock_timeout_us must be > 0".to_string(),
            ));
        }
        if self.control_cycle_us == 0 || self.fieldbus_cycle_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle times must be > 0".to_string(),
            ));
        }
        if self.calibration_queue_capacity == 0
            || self.calibration_queue_capacity > MAX_CALIBRATION_SAMPLES
        {
            return Err(ConfigError::ValidationError(format!(
                "calibration_queue_capacity must be in 1..={MAX_CALIBRATION_SAMPLES}, got {}",
                self.calibration_queue_capacity
            )));
        }
        Ok(())
    }

    /// Commit lock timeout as a `Duration`.
    #[inline]
    pub fn write_lock_timeout(&self) -> Duration {
        Duration::from_micros(self.write_lock_timeout_us)
    }

    /// Control loop period as a `Duration`.
    #[inline]
    pub fn control_cycle(&self) -> Duration {
        Duration::from_micros(self.control_cycle_us)
    }

    /// Fieldbus cycle period as a `Duration`.
    #[inline]
    pub fn fieldbus_cycle(&self) -> Duration {
        Duration::from_micros(self.fieldbus_cycle_us)
    }
}

/// Complete configuration file of a process hosting the state store.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "tracker-site-01"
///
/// [store]
/// fieldbus_cycle_us = 2000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStoreConfig {
    /// Common fields.
    pub shared: SharedConfig,
    /// Store settings; every field has a default.
    #[serde(default)]
    pub store: StoreSettings,
}

impl StateStoreConfig {
    /// Load from `path` and validate both sections.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.shared.validate()?;
        config.store.validate()?;
        Ok(config)
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation: any serde-deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
