//! Error types for the plant-monitor crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// No level matches the value, even with the hysteresis margin applied.
    #[error("Value out of range: {value} % matches no configured level")]
    OutOfRange {
        /// The normalized value that could not be classified.
        value: u8,
    },

    /// More than one level matches the value without any margin applied.
    #[error("Ambiguous level overlap at {value} %: {levels:?}")]
    AmbiguousOverlap {
        /// The normalized value that was classified.
        value: u8,
        /// Names of all levels matching the value.
        levels: Vec<String>,
    },

    /// The configured level table is not a valid tiling of 0..=100.
    #[error("Invalid level configuration: {reason}")]
    InvalidLevels {
        /// Description of the violated invariant.
        reason: String,
    },

    /// A scalar configuration value is invalid.
    #[error("Invalid configuration: {name} = {value}")]
    InvalidConfig {
        /// The name of the configuration key.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[cfg(feature = "serde")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether this error indicates a misconfigured level table.
    ///
    /// Classification errors are never transient: retrying the same reading
    /// against the same level table yields the same error.
    pub fn is_classification_error(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::AmbiguousOverlap { .. })
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_errors() {
        assert!(Error::OutOfRange { value: 3 }.is_classification_error());
        assert!(Error::AmbiguousOverlap {
            value: 3,
            levels: vec!["low".into(), "normal".into()],
        }
        .is_classification_error());
        assert!(!Error::InvalidLevels {
            reason: "empty".into()
        }
        .is_classification_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::AmbiguousOverlap {
            value: 30,
            levels: vec!["low".into(), "normal".into()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous level overlap at 30 %: [\"low\", \"normal\"]"
        );
        assert_eq!(
            Error::OutOfRange { value: 101 }.to_string(),
            "Value out of range: 101 % matches no configured level"
        );
    }
}
