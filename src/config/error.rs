//! Configuration Error Types

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Layered sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
