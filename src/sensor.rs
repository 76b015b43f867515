//! Sensor normalization and smoothing.
//!
//! Converts raw ADC readings of a capacitive moisture sensor into a smoothed
//! wetness percentage. The raw sensor measures dryness (higher raw value means
//! drier soil), so the normalized value is inverted.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::config::AdcConfig;
use crate::data::{Direction, SensorReading, SensorSnapshot, MAX_PERCENT};

/// Fixed-length FIFO of normalized values feeding the moving average.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    values: VecDeque<u8>,
    capacity: usize,
}

impl SmoothingWindow {
    /// Create a window holding up to `capacity` values (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, evicting the oldest one if the window is full, and
    /// return the new average.
    pub fn push(&mut self, value: u8) -> u8 {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.average()
    }

    /// Mean of the stored values, rounded half away from zero.
    ///
    /// Returns 0 for an empty window.
    pub fn average(&self) -> u8 {
        if self.values.is_empty() {
            return 0;
        }
        let sum: u32 = self.values.iter().map(|&v| u32::from(v)).sum();
        (f64::from(sum) / self.values.len() as f64).round() as u8
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no value has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of stored values.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Normalized, smoothed state of a single moisture sensor.
///
/// Not internally synchronized: readings are expected to be fed from one
/// sequential consumer.
#[derive(Debug, Clone)]
pub struct SensorState {
    adc: AdcConfig,
    noise_margin_pct: u8,
    window: SmoothingWindow,
    current: Option<SensorReading>,
    history: Option<SensorReading>,
    last_updated: Option<DateTime<Utc>>,
}

impl SensorState {
    /// Create a sensor from its ADC calibration and moving-average length.
    ///
    /// The calibration is expected to be validated already
    /// (`raw_upper_bound > raw_lower_bound`); see
    /// [`MonitorConfig::validate`](crate::config::MonitorConfig::validate).
    pub fn new(adc: AdcConfig, moving_average_len: usize) -> Self {
        let noise_margin_pct = scale_to_percent(i64::from(adc.raw_noise_margin), &adc)
            .clamp(0.0, f64::from(MAX_PERCENT)) as u8;
        let window = SmoothingWindow::new(moving_average_len);

        info!(
            "Sensor initialized: raw range {}..{}, noise margin {} %, moving average length {}",
            adc.raw_lower_bound,
            adc.raw_upper_bound,
            noise_margin_pct,
            window.capacity()
        );

        Self {
            adc,
            noise_margin_pct,
            window,
            current: None,
            history: None,
            last_updated: None,
        }
    }

    /// Feed a raw reading and return the new smoothed value and direction.
    ///
    /// The first update is always [`Direction::Steady`].
    pub fn update(&mut self, raw_value: i32) -> SensorReading {
        let normalized = self.normalize(raw_value);
        let average = self.window.push(normalized);

        let direction = match self.current {
            Some(previous) => Direction::between(previous.value, average),
            None => {
                debug!("No sensor history yet, assuming steady direction");
                Direction::Steady
            }
        };

        let reading = SensorReading::new(average, direction);
        self.history = self.current.replace(reading);
        self.last_updated = Some(Utc::now());

        debug!(
            "Raw sensor value {} normalized to {} %, smoothed to {} % ({})",
            raw_value, normalized, average, direction
        );

        reading
    }

    /// Map a raw reading to wetness in percent, clamped to 0..=100.
    pub fn normalize(&self, raw_value: i32) -> u8 {
        let raw_delta = i64::from(raw_value) - i64::from(self.adc.raw_lower_bound);
        let dryness = scale_to_percent(raw_delta, &self.adc)
            .clamp(0.0, f64::from(MAX_PERCENT));

        (f64::from(MAX_PERCENT) - dryness) as u8
    }

    /// Raw noise margin expressed in percent of the raw range.
    pub fn noise_margin_pct(&self) -> u8 {
        self.noise_margin_pct
    }

    /// Latest smoothed reading, if any reading has been received.
    pub fn current(&self) -> Option<SensorReading> {
        self.current
    }

    /// The reading before the latest one.
    pub fn history(&self) -> Option<SensorReading> {
        self.history
    }

    /// Check if at least one reading has been received.
    pub fn has_reading(&self) -> bool {
        self.current.is_some()
    }

    /// Time of the latest update.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Snapshot of the latest reading for sharing with other tasks.
    pub fn snapshot(&self) -> Option<SensorSnapshot> {
        match (self.current, self.last_updated) {
            (Some(reading), Some(last_updated)) => Some(SensorSnapshot {
                reading,
                last_updated,
            }),
            _ => None,
        }
    }

    /// Moving-average window.
    pub fn window(&self) -> &SmoothingWindow {
        &self.window
    }
}

fn scale_to_percent(raw_delta: i64, adc: &AdcConfig) -> f64 {
    raw_delta as f64 * 100.0 / adc.span() as f64
}
