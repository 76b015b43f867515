//! Data structures shared by the classification engine.
//!
//! This module contains the level definitions, sensor readings and
//! classification results passed between the sensor, the quantizer and
//! the timers.

pub mod level;
pub mod reading;

pub use level::{Level, LevelSet, MAX_PERCENT};
pub use reading::{Direction, LevelEvaluation, Quantization, SensorReading, SensorSnapshot};
