//! Monitor configuration.
//!
//! Configuration is an explicit value handed to [`PlantMonitor::new`] and
//! re-supplied through [`PlantMonitor::reload`]. With the `serde` feature it
//! can be loaded from YAML:
//!
//! ```yaml
//! sensor:
//!   adc:
//!     raw_lower_bound: 1491
//!     raw_upper_bound: 3624
//!     raw_noise_margin: 90
//!   moving_average_len: 3
//! watchdog:
//!   timeout: 7200
//! levels:
//!   - { name: low, start: 0, end: 30, notification_interval: 21600 }
//!   - { name: normal, start: 31, end: 66 }
//!   - { name: high, start: 67, end: 100, notification_interval: 43200 }
//! ```
//!
//! [`PlantMonitor::new`]: crate::monitor::PlantMonitor::new
//! [`PlantMonitor::reload`]: crate::monitor::PlantMonitor::reload

use std::time::Duration;

use crate::data::{Level, LevelSet};
use crate::error::{Error, Result};

/// Raw ADC calibration of the moisture sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdcConfig {
    /// Raw value of a fully wet sensor.
    pub raw_lower_bound: i32,
    /// Raw value of a fully dry sensor.
    pub raw_upper_bound: i32,
    /// Typical raw noise amplitude.
    pub raw_noise_margin: i32,
}

impl AdcConfig {
    /// Width of the raw range. Widened so extreme bounds cannot overflow.
    pub fn span(&self) -> i64 {
        i64::from(self.raw_upper_bound) - i64::from(self.raw_lower_bound)
    }
}

/// Sensor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// ADC calibration.
    pub adc: AdcConfig,
    /// Moving-average window length; values below 1 disable smoothing.
    #[cfg_attr(feature = "serde", serde(default = "default_moving_average_len"))]
    pub moving_average_len: usize,
}

#[cfg(feature = "serde")]
fn default_moving_average_len() -> usize {
    1
}

/// One entry of the level table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelConfig {
    /// Unique level name.
    pub name: String,
    /// First value (inclusive).
    pub start: u8,
    /// Last value (inclusive).
    pub end: u8,
    /// Reminder interval in seconds; 0 disables reminders.
    #[cfg_attr(feature = "serde", serde(default))]
    pub notification_interval: u64,
}

impl From<&LevelConfig> for Level {
    fn from(config: &LevelConfig) -> Self {
        Level::new(
            config.name.clone(),
            config.start,
            config.end,
            Duration::from_secs(config.notification_interval),
        )
    }
}

/// Staleness watchdog settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchdogConfig {
    /// Seconds without a reading before the sensor is reported stale.
    pub timeout: u64,
}

/// Complete configuration of the classification engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorConfig {
    /// Sensor settings.
    pub sensor: SensorConfig,
    /// Level table, ordered by `start`.
    pub levels: Vec<LevelConfig>,
    /// Watchdog settings.
    pub watchdog: WatchdogConfig,
}

impl MonitorConfig {
    /// Validate every field and build the level set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for invalid scalar settings and
    /// [`Error::InvalidLevels`] if the level table does not tile 0..=100.
    pub fn validate(&self) -> Result<LevelSet> {
        let adc = &self.sensor.adc;

        if adc.span() <= 0 {
            return Err(Error::InvalidConfig {
                name: "sensor.adc.raw_upper_bound".to_string(),
                value: format!(
                    "{} (must exceed raw_lower_bound {})",
                    adc.raw_upper_bound, adc.raw_lower_bound
                ),
            });
        }

        if adc.raw_noise_margin < 0 {
            return Err(Error::InvalidConfig {
                name: "sensor.adc.raw_noise_margin".to_string(),
                value: adc.raw_noise_margin.to_string(),
            });
        }

        if self.watchdog.timeout == 0 {
            return Err(Error::InvalidConfig {
                name: "watchdog.timeout".to_string(),
                value: "0".to_string(),
            });
        }

        self.level_set()
    }

    /// Build the validated level set from the level table.
    pub fn level_set(&self) -> Result<LevelSet> {
        LevelSet::new(self.levels.iter().map(Level::from).collect())
    }

    /// Watchdog timeout as a duration.
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_secs(self.watchdog.timeout)
    }

    /// Parse and validate a YAML document.
    #[cfg(feature = "serde")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    #[cfg(feature = "serde")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}
