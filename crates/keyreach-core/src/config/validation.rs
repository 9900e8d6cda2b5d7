//! Configuration validation utilities and rules

use crate::KeyringError;
use std::fmt;

/// Configuration validation result
pub type ValidationResult = Result<(), ValidationError>;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value is out of acceptable range
    OutOfRange {
        /// Offending field
        field: String,
        /// Inclusive lower bound
        min: Option<u64>,
        /// Inclusive upper bound
        max: Option<u64>,
        /// Value found
        actual: u64,
    },
    /// Custom validation failed
    Custom {
        /// Offending field
        field: String,
        /// Why the value was rejected
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => {
                let range_desc = match (min, max) {
                    (Some(min), Some(max)) => format!("between {min} and {max}"),
                    (Some(min), None) => format!("at least {min}"),
                    (None, Some(max)) => format!("at most {max}"),
                    (None, None) => "in valid range".to_string(),
                };
                write!(f, "Field '{field}' must be {range_desc} (got {actual})")
            }
            ValidationError::Custom { field, message } => {
                write!(f, "Field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for KeyringError {
    fn from(err: ValidationError) -> Self {
        KeyringError::invalid(err.to_string())
    }
}

/// Configuration validator that accumulates validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that a number is within an inclusive range
    pub fn range(&mut self, field_name: &str, value: u64, min: u64, max: u64) -> &mut Self {
        if value < min || value > max {
            self.errors.push(ValidationError::OutOfRange {
                field: field_name.to_string(),
                min: Some(min),
                max: Some(max),
                actual: value,
            });
        }
        self
    }

    /// Validate using a custom predicate
    pub fn custom<T, F>(&mut self, field_name: &str, value: &T, predicate: F, message: &str) -> &mut Self
    where
        F: FnOnce(&T) -> bool,
    {
        if !predicate(value) {
            self.errors.push(ValidationError::Custom {
                field: field_name.to_string(),
                message: message.to_string(),
            });
        }
        self
    }

    /// First error, if any
    pub fn result(self) -> ValidationResult {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(first),
        }
    }

    /// Get all validation errors
    pub fn all_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
