//! Unified error type for keyring operations
//!
//! Every crate in the workspace returns [`KeyringError`]. The variants are the
//! outcomes a caller has to tell apart: a key that does not exist is
//! `NotFound`, a key that exists but is not possessed is `Denied`.

use serde::{Deserialize, Serialize};

/// Unified error type for all keyring operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum KeyringError {
    /// Serial or description could not be resolved
    #[error("Not found: {message}")]
    NotFound {
        /// What was looked up
        message: String,
    },

    /// Target of an operation is missing or is the wrong kind of key
    #[error("Invalid target: {message}")]
    InvalidTarget {
        /// Description of the offending target
        message: String,
    },

    /// Effective permissions do not include the required capability
    #[error("Permission denied: {message}")]
    Denied {
        /// Which capability was missing and on what
        message: String,
    },

    /// Malformed input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration failure
        message: String,
    },
}

impl KeyringError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid target error
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn denied(message: impl Into<String>) -> Self {
        Self::Denied {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for `Denied`
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// Standard Result type for keyring operations
pub type Result<T> = std::result::Result<T, KeyringError>;

impl From<std::io::Error> for KeyringError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::denied(err.to_string()),
            _ => Self::config(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for KeyringError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = KeyringError::denied("read on 7");
        assert!(err.is_denied());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Permission denied: read on 7");
    }

    #[test]
    fn test_denied_and_not_found_differ() {
        assert_ne!(KeyringError::denied("x"), KeyringError::not_found("x"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        assert!(KeyringError::from(io_err).is_not_found());

        let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "garbage");
        assert!(matches!(
            KeyringError::from(io_err),
            KeyringError::Config { .. }
        ));
    }
}
