//! # plant-monitor
//!
//! Classification engine for a soil-moisture sensor.
//!
//! Raw ADC readings are normalized to a smoothed wetness percentage,
//! classified into named levels (e.g. low / normal / high) with hysteresis,
//! and turned into notifications: one when the level changes, periodic
//! reminders while an urgent level persists, and a warning when the sensor
//! goes silent.
//!
//! ## Components
//!
//! - [`SensorState`]: normalization and moving-average smoothing
//! - [`LevelQuantizer`]: two-phase level matching with hysteresis
//! - [`ReminderScheduler`]: cancellable periodic reminder task
//! - [`StalenessWatchdog`]: re-armable deadline for incoming readings
//! - [`PlantMonitor`]: sequential reading consumer wiring them together
//!
//! Transports, message templates and configuration files are left to the
//! application; the engine only emits [`Notification`]s through a
//! [`Notifier`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plant_monitor::{ChannelNotifier, MonitorConfig, PlantMonitor, Result};
//! use std::sync::Arc;
//!
//! # async fn run(config: MonitorConfig) -> Result<()> {
//! let (notifier, mut outbound) = ChannelNotifier::channel();
//! let mut monitor = PlantMonitor::new(&config, Arc::new(notifier))?;
//!
//! tokio::spawn(async move {
//!     while let Some(notification) = outbound.recv().await {
//!         println!("{}", notification);
//!     }
//! });
//!
//! monitor.handle_reading(2557).await?;
//! monitor.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization and YAML configuration loading

// Public modules
pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod quantizer;
pub mod sensor;
pub mod timers;

// Re-exports for convenience
pub use config::{AdcConfig, LevelConfig, MonitorConfig, SensorConfig, WatchdogConfig};
pub use data::{
    Direction, Level, LevelEvaluation, LevelSet, Quantization, SensorReading, SensorSnapshot,
};
pub use error::{Error, Result};
pub use monitor::{PlantMonitor, ReadingOutcome};
pub use notifier::{ChannelNotifier, Notification, Notifier};
pub use quantizer::LevelQuantizer;
pub use sensor::{SensorState, SmoothingWindow};
pub use timers::{ReminderScheduler, StalenessWatchdog};
