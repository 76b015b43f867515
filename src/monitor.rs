//! Reading consumer wiring the engine together.
//!
//! [`PlantMonitor`] processes raw readings one at a time, to completion:
//! reset the watchdog, normalize, classify, then decide whether to notify
//! and whether to (re)arm the reminder.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::config::MonitorConfig;
use crate::data::{LevelEvaluation, SensorReading, SensorSnapshot};
use crate::error::Result;
use crate::notifier::{Notification, Notifier};
use crate::quantizer::LevelQuantizer;
use crate::sensor::SensorState;
use crate::timers::{ReminderScheduler, StalenessWatchdog};

/// What happened to a single reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingOutcome {
    /// Smoothed sensor reading.
    pub reading: SensorReading,
    /// Level classification.
    pub evaluation: LevelEvaluation,
    /// Whether a level notification was emitted.
    pub notified: bool,
}

/// Sequential consumer of raw sensor readings.
///
/// Owns the sensor and quantizer state exclusively; the timers run as
/// background tasks and report through the shared [`Notifier`].
pub struct PlantMonitor {
    /// Normalization and smoothing.
    sensor: SensorState,
    /// Level classification.
    quantizer: LevelQuantizer,
    /// Reminder for levels with a notification interval.
    reminder: ReminderScheduler,
    /// Staleness watchdog.
    watchdog: StalenessWatchdog,
    /// Outbound notifications.
    notifier: Arc<dyn Notifier>,
    /// Latest sensor snapshot for timer tasks and status queries.
    snapshot_tx: watch::Sender<Option<SensorSnapshot>>,
}

impl PlantMonitor {
    /// Validate the configuration and build an idle monitor.
    ///
    /// Must be called within a tokio runtime context once readings are fed,
    /// since the timers spawn tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &MonitorConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let levels = config.validate()?;

        let sensor = SensorState::new(config.sensor.adc, config.sensor.moving_average_len);
        let quantizer = LevelQuantizer::new(levels);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let reminder = ReminderScheduler::new(notifier.clone(), snapshot_rx);
        let watchdog = StalenessWatchdog::new(config.watchdog_timeout(), notifier.clone());

        info!("Plant monitor initialized");

        Ok(Self {
            sensor,
            quantizer,
            reminder,
            watchdog,
            notifier,
            snapshot_tx,
        })
    }

    /// Process one raw reading.
    ///
    /// A level notification is emitted when the level changed or when this
    /// is the first classified reading; the reminder is then re-armed for the
    /// new level. Steady readings leave a running reminder untouched.
    ///
    /// # Errors
    ///
    /// Returns a classification error if the value matches no level
    /// unambiguously. The watchdog has been reset regardless, and no
    /// notification or reminder change happens for that reading.
    pub async fn handle_reading(&mut self, raw_value: i32) -> Result<ReadingOutcome> {
        self.watchdog.reset().await;

        let reading = self.sensor.update(raw_value);
        self.snapshot_tx.send_replace(self.sensor.snapshot());

        let had_history = self.quantizer.history_exists();
        let evaluation = match self
            .quantizer
            .evaluate(reading.value, self.sensor.noise_margin_pct())
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!("Could not classify {} %: {}", reading.value, e);
                return Err(e);
            }
        };

        let notify = evaluation.level_changed() || !had_history;
        if notify {
            info!(
                "Level '{}' ({}) at {} %",
                evaluation.level.name, evaluation.direction, reading.value
            );

            self.notifier.notify(Notification::LevelChanged {
                level: evaluation.level.clone(),
                direction: evaluation.direction,
                value: reading.value,
            });
            self.reminder.set(evaluation.level.clone()).await;
        } else {
            debug!(
                "Level '{}' unchanged at {} %",
                evaluation.level.name, reading.value
            );
        }

        Ok(ReadingOutcome {
            reading,
            evaluation,
            notified: notify,
        })
    }

    /// Consume readings until the channel closes, then shut down.
    pub async fn run(&mut self, mut readings: mpsc::Receiver<i32>) {
        info!("Waiting for sensor readings");

        while let Some(raw_value) = readings.recv().await {
            debug!("Received raw reading {}", raw_value);
            // Classification errors are logged by handle_reading
            let _ = self.handle_reading(raw_value).await;
        }

        info!("Reading channel closed");
        self.shutdown().await;
    }

    /// Apply a new configuration.
    ///
    /// Only the level table is reloaded; classification history survives.
    /// Sensor calibration and watchdog timeout keep their startup values.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the active levels if the new configuration
    /// is invalid.
    pub fn reload(&mut self, config: &MonitorConfig) -> Result<()> {
        let levels = config.validate()?;
        self.quantizer.reload(levels);
        Ok(())
    }

    /// Stop the reminder and disarm the watchdog, joining both tasks.
    pub async fn shutdown(&self) {
        info!("Shutting down plant monitor");
        self.reminder.stop().await;
        self.watchdog.disarm().await;
    }

    /// Subscribe to sensor snapshots, e.g. for answering status queries.
    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<SensorSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Sensor state.
    pub fn sensor(&self) -> &SensorState {
        &self.sensor
    }

    /// Quantizer state.
    pub fn quantizer(&self) -> &LevelQuantizer {
        &self.quantizer
    }

    /// Reminder scheduler.
    pub fn reminder(&self) -> &ReminderScheduler {
        &self.reminder
    }

    /// Staleness watchdog.
    pub fn watchdog(&self) -> &StalenessWatchdog {
        &self.watchdog
    }
}
