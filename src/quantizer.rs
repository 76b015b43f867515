//! Level quantizer with hysteresis.
//!
//! Maps smoothed moisture values to discrete [`Level`]s. Matching runs in two
//! phases:
//!
//! 1. **Blurry match**: every level whose range, widened by half the sensor
//!    noise margin on both sides, contains the value is a candidate.
//! 2. If several candidates remain and the previously resolved level is one
//!    of them, the previous level is kept. Otherwise a **sharp match** without
//!    margin must yield exactly one level.
//!
//! Keeping the previous level inside the widened band is the hysteresis: a
//! reading that crosses a boundary by no more than the margin does not flip
//! the level.

use tracing::{debug, info};

use crate::data::{Direction, Level, LevelEvaluation, LevelSet, Quantization};
use crate::error::{Error, Result};

/// Classifies smoothed values into levels and tracks level direction.
///
/// Not internally synchronized: evaluations are expected to come from one
/// sequential consumer.
#[derive(Debug, Clone)]
pub struct LevelQuantizer {
    levels: LevelSet,
    current: Option<Quantization>,
    history: Option<Quantization>,
}

impl LevelQuantizer {
    /// Create a quantizer with no history.
    pub fn new(levels: LevelSet) -> Self {
        info!("Quantizer initialized with levels:\n{}", levels);

        Self {
            levels,
            current: None,
            history: None,
        }
    }

    /// Classify `value` and derive the level direction.
    ///
    /// The direction is [`Direction::Steady`] unless the resolved level
    /// differs from the previous one, in which case it is `Up` if the value
    /// rose and `Down` otherwise. The first evaluation is always steady.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if no level matches and
    /// [`Error::AmbiguousOverlap`] if the sharp match is not unique. The
    /// quantizer state is left untouched on error.
    pub fn evaluate(&mut self, value: u8, noise_margin_pct: u8) -> Result<LevelEvaluation> {
        let margin = noise_margin_pct / 2;
        let level = self.resolve(value, margin)?;

        let direction = match &self.current {
            Some(previous) if previous.level.name != level.name => {
                if value > previous.value {
                    Direction::Up
                } else {
                    Direction::Down
                }
            }
            Some(_) => Direction::Steady,
            None => {
                debug!("No quantizer history yet");
                Direction::Steady
            }
        };

        debug!(
            "Value {} % (margin {}) resolved to level '{}' ({})",
            value, margin, level.name, direction
        );

        self.history = self.current.replace(Quantization {
            value,
            level: level.clone(),
        });

        Ok(LevelEvaluation { direction, level })
    }

    /// Swap the level set, keeping the classification history.
    ///
    /// Hysteresis after a reload matches the previous level by name, so a
    /// level that survives the reload stays sticky.
    pub fn reload(&mut self, levels: LevelSet) {
        info!("Quantizer levels reloaded:\n{}", levels);
        self.levels = levels;
    }

    /// Check if at least one value has been classified.
    pub fn history_exists(&self) -> bool {
        self.current.is_some()
    }

    /// Latest classification result.
    pub fn current(&self) -> Option<&Quantization> {
        self.current.as_ref()
    }

    /// Classification result before the latest one.
    pub fn history(&self) -> Option<&Quantization> {
        self.history.as_ref()
    }

    /// Active level set.
    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    fn resolve(&self, value: u8, margin: u8) -> Result<Level> {
        let candidates = self.levels.matching(value, margin);

        match candidates.as_slice() {
            [] => Err(Error::OutOfRange { value }),
            [only] => Ok((*only).clone()),
            _ => {
                let previous = self.current.as_ref().map(|q| q.level.name.as_str());
                if let Some(sticky) = candidates.iter().find(|l| Some(l.name.as_str()) == previous) {
                    return Ok((*sticky).clone());
                }

                let sharp = self.levels.matching(value, 0);
                match sharp.as_slice() {
                    [] => Err(Error::OutOfRange { value }),
                    [only] => Ok((*only).clone()),
                    _ => Err(Error::AmbiguousOverlap {
                        value,
                        levels: sharp.iter().map(|l| l.name.clone()).collect(),
                    }),
                }
            }
        }
    }
}
