//! Store configuration.
//!
//! Both values are fixed for the life of a store. In TOML they are written
//! in whole seconds:
//!
//! ```toml
//! retention_secs = 3600
//! sweep_interval_secs = 60
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};

/// Default retention period (one hour).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Default interval between retention sweeps (one minute).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a [`LogStore`](crate::LogStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum age an entry may reach before it is eligible for eviction.
    #[serde(rename = "retention_secs", with = "duration_secs")]
    pub retention: Duration,
    /// How often the retention sweeper runs.
    #[serde(rename = "sweep_interval_secs", with = "duration_secs")]
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Sets the retention period.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the sweep interval.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| LogError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either duration is zero or not a whole number of
    /// seconds, since the file format only stores whole seconds.
    pub fn validate(&self) -> Result<()> {
        if self.retention.is_zero() {
            return Err(LogError::Config(
                "retention period must be non-zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(LogError::Config(
                "sweep interval must be non-zero".to_string(),
            ));
        }
        if self.retention.subsec_nanos() != 0 {
            return Err(LogError::Config(
                "retention period must be a whole number of seconds".to_string(),
            ));
        }
        if self.sweep_interval.subsec_nanos() != 0 {
            return Err(LogError::Config(
                "sweep interval must be a whole number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
