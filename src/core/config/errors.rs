//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a configuration file does not exist.
    #[error("configuration file does not exist: {path}")]
    FileNotFound { path: std::path::PathBuf },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that the alphabet table is inconsistent.
    #[error("invalid alphabet: {message}")]
    InvalidAlphabet { message: String },

    /// Error indicating that the grid layout cannot hold the alphabet.
    #[error("invalid grid layout: {message}")]
    InvalidGrid { message: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidConfig`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// A trait for validating configuration sections.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates that a value is strictly positive.
    fn validate_positive_f32(&self, value: f32, name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            Err(ConfigError::invalid(format!(
                "{} must be a positive finite number, got {}",
                name, value
            )))
        } else {
            Ok(())
        }
    }

    /// Validates that a value lies within `[min, max]`.
    fn validate_range_f32(&self, value: f32, min: f32, max: f32, name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value < min || value > max {
            Err(ConfigError::invalid(format!(
                "{} must be in range [{}, {}], got {}",
                name, min, max, value
            )))
        } else {
            Ok(())
        }
    }
}
