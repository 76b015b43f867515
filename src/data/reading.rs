//! Sensor reading and classification result types.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

use super::level::Level;

/// Direction of a value or level relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Decreased compared to the previous value.
    Down,
    /// Unchanged, or no previous value exists.
    #[default]
    Steady,
    /// Increased compared to the previous value.
    Up,
}

impl Direction {
    /// Derive a direction by comparing a new value against a previous one.
    pub fn between<T: Ord>(previous: T, current: T) -> Self {
        match current.cmp(&previous) {
            Ordering::Greater => Self::Up,
            Ordering::Less => Self::Down,
            Ordering::Equal => Self::Steady,
        }
    }

    /// Check if this direction is steady.
    pub fn is_steady(&self) -> bool {
        matches!(self, Self::Steady)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Steady => write!(f, "steady"),
            Self::Up => write!(f, "up"),
        }
    }
}

/// A smoothed sensor value together with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Smoothed wetness in percent (0..=100).
    pub value: u8,
    /// Direction relative to the previous smoothed value.
    pub direction: Direction,
}

impl SensorReading {
    /// Create a new sensor reading.
    pub fn new(value: u8, direction: Direction) -> Self {
        Self { value, direction }
    }
}

/// Point-in-time view of the sensor, shared with background tasks and
/// status responders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSnapshot {
    /// Latest smoothed reading.
    pub reading: SensorReading,
    /// When the sensor was last updated.
    pub last_updated: DateTime<Utc>,
}

impl SensorSnapshot {
    /// Smoothed wetness in percent.
    pub fn value(&self) -> u8 {
        self.reading.value
    }

    /// Time elapsed since the last update.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.last_updated)
    }
}

/// A classified value: the value and the level it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantization {
    /// The classified value.
    pub value: u8,
    /// The level the value resolved to.
    pub level: Level,
}

/// Result of evaluating a value against the level set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelEvaluation {
    /// Level direction: steady unless the level changed.
    pub direction: Direction,
    /// The resolved level.
    pub level: Level,
}

impl LevelEvaluation {
    /// Check if the level changed compared to the previous evaluation.
    pub fn level_changed(&self) -> bool {
        !self.direction.is_steady()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_direction_between() {
        assert_eq!(Direction::between(10, 20), Direction::Up);
        assert_eq!(Direction::between(20, 10), Direction::Down);
        assert_eq!(Direction::between(20, 20), Direction::Steady);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::default(), Direction::Steady);
        assert!(Direction::default().is_steady());
    }

    #[test]
    fn test_snapshot_age() {
        let snapshot = SensorSnapshot {
            reading: SensorReading::new(42, Direction::Up),
            last_updated: Utc::now() - chrono::Duration::seconds(30),
        };

        assert_eq!(snapshot.value(), 42);
        assert!(snapshot.age() >= chrono::Duration::seconds(30));
    }

    #[test]
    fn test_level_evaluation_changed() {
        let level = Level::new("low", 0, 30, Duration::ZERO);
        let eval = LevelEvaluation {
            direction: Direction::Steady,
            level: level.clone(),
        };
        assert!(!eval.level_changed());

        let eval = LevelEvaluation {
            direction: Direction::Down,
            level,
        };
        assert!(eval.level_changed());
    }
}
