//! Moisture level data structures.
//!
//! A [`Level`] is a named, bounded range of normalized moisture values.
//! A [`LevelSet`] is a validated, ordered collection of levels that tiles
//! the full 0..=100 % range without gaps or overlaps.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};

use crate::error::{Error, Result};

/// Upper bound of the normalized value range.
pub const MAX_PERCENT: u8 = 100;

/// A named moisture level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Level {
    /// Unique level name, e.g. "low", "normal" or "high".
    pub name: String,
    /// First value (inclusive) belonging to this level.
    pub start: u8,
    /// Last value (inclusive) belonging to this level.
    pub end: u8,
    /// Reminder period while this level is active. Zero disables reminders.
    pub notification_interval: Duration,
}

impl Level {
    /// Create a new level.
    pub fn new(
        name: impl Into<String>,
        start: u8,
        end: u8,
        notification_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            notification_interval,
        }
    }

    /// Check whether `value` lies within `[start - margin, end + margin]`.
    pub fn contains(&self, value: u8, margin: u8) -> bool {
        let lower = i16::from(self.start) - i16::from(margin);
        let upper = i16::from(self.end) + i16::from(margin);
        let value = i16::from(value);

        value >= lower && value <= upper
    }

    /// Check if this level requests periodic reminders.
    pub fn has_reminder(&self) -> bool {
        !self.notification_interval.is_zero()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}..={} %)", self.name, self.start, self.end)
    }
}

/// An ordered, validated set of levels covering 0..=100 %.
///
/// Cloning is cheap; the levels are shared behind an `Arc` so a reload can
/// swap the whole set at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSet {
    levels: Arc<[Level]>,
}

impl LevelSet {
    /// Validate and build a level set.
    ///
    /// Levels must be ordered by `start`, each with `start <= end <= 100`,
    /// adjacent levels must satisfy `end[i] + 1 == start[i + 1]`, the first
    /// level must start at 0, the last must end at 100 and names must be
    /// unique.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLevels`] if any of these invariants is violated.
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        let (first, last) = match (levels.first(), levels.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(invalid("no levels configured")),
        };

        let mut names = HashSet::new();
        for level in &levels {
            if level.start > level.end {
                return Err(invalid(format!(
                    "level '{}' starts at {} after its end {}",
                    level.name, level.start, level.end
                )));
            }
            if level.end > MAX_PERCENT {
                return Err(invalid(format!(
                    "level '{}' ends at {} (max {})",
                    level.name, level.end, MAX_PERCENT
                )));
            }
            if !names.insert(level.name.as_str()) {
                return Err(invalid(format!("duplicate level name '{}'", level.name)));
            }
        }

        if first.start != 0 {
            return Err(invalid(format!(
                "first level '{}' starts at {} instead of 0",
                first.name, first.start
            )));
        }
        if last.end != MAX_PERCENT {
            return Err(invalid(format!(
                "last level '{}' ends at {} instead of {}",
                last.name, last.end, MAX_PERCENT
            )));
        }

        for pair in levels.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            let expected = u16::from(lower.end) + 1;
            let actual = u16::from(upper.start);

            if actual > expected {
                return Err(invalid(format!(
                    "gap between '{}' (ends {}) and '{}' (starts {})",
                    lower.name, lower.end, upper.name, upper.start
                )));
            }
            if actual < expected {
                return Err(invalid(format!(
                    "'{}' (ends {}) overlaps or is out of order with '{}' (starts {})",
                    lower.name, lower.end, upper.name, upper.start
                )));
            }
        }

        Ok(Self {
            levels: levels.into(),
        })
    }

    /// Build a set without validation, for exercising misconfigured tables.
    #[cfg(test)]
    pub(crate) fn unchecked(levels: Vec<Level>) -> Self {
        Self {
            levels: levels.into(),
        }
    }

    /// Iterate over the levels in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Level> {
        self.levels.iter()
    }

    /// Get the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// A validated set is never empty; provided for API completeness.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Look up a level by name.
    pub fn get(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Collect every level whose margin-expanded range contains `value`.
    pub fn matching(&self, value: u8, margin: u8) -> Vec<&Level> {
        self.levels
            .iter()
            .filter(|l| l.contains(value, margin))
            .collect()
    }
}

impl<'a> IntoIterator for &'a LevelSet {
    type Item = &'a Level;
    type IntoIter = std::slice::Iter<'a, Level>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One row of the level table printout.
#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "Level")]
    name: String,
    #[tabled(rename = "From")]
    start: u8,
    #[tabled(rename = "To")]
    end: u8,
}

impl From<&Level> for LevelRow {
    fn from(level: &Level) -> Self {
        Self {
            name: level.name.clone(),
            start: level.start,
            end: level.end,
        }
    }
}

impl fmt::Display for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = Table::new(self.levels.iter().map(LevelRow::from));
        write!(f, "{}", table)
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidLevels {
        reason: reason.into(),
    }
}
