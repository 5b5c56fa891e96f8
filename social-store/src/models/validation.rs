//! Validation error types

use std::fmt;

/// Validation error for query and model input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric field outside its allowed range
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Too many entries in a list field
    TooMany { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                min,
                max,
                value,
            } => write!(f, "{} must be between {} and {}, got {}", field, min, max, value),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooMany { field, max } => {
                write!(f, "{} accepts at most {} entries", field, max)
            }
            Self::InvalidFormat {
                field,
                value,
                reason,
            } => {
                write!(f, "{} '{}': {}", field, value, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "search",
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "search exceeds maximum length of 100 characters"
        );

        let err = ValidationError::OutOfRange {
            field: "limit",
            min: 1,
            max: 20,
            value: 50,
        };
        assert_eq!(err.to_string(), "limit must be between 1 and 20, got 50");
    }
}
