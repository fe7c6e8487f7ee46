//! # Premises Configuration System
//!
//! Layered configuration: built-in defaults, then `config/premises.toml`, then
//! `config/premises.<environment>.toml`, then `PREMISES__*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use premises_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let max_temperature = manager.config().equipment.max_temperature_c;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PremisesConfig {
    pub logging: LoggingConfig,
    pub equipment: EquipmentConfig,
    pub store: StoreConfig,
    pub events: EventsConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines regardless of environment
    pub json: bool,
}

/// Argument bounds for equipment setting operations
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EquipmentConfig {
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub max_brightness: u8,
    pub min_floor: i32,
    pub max_floor: i32,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            min_temperature_c: 16.0,
            max_temperature_c: 30.0,
            max_brightness: 100,
            min_floor: -2,
            max_floor: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix of status-change application numbers
    pub application_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            application_prefix: "SC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast capacity for transition events
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/premises_development".to_string(),
            max_connections: 10,
        }
    }
}

impl PremisesConfig {
    /// Validate cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        let equipment = &self.equipment;
        if equipment.min_temperature_c >= equipment.max_temperature_c {
            return Err(ConfigurationError::invalid_value(
                "equipment.min_temperature_c",
                equipment.min_temperature_c,
                "must be lower than equipment.max_temperature_c",
            ));
        }

        if equipment.min_floor > equipment.max_floor {
            return Err(ConfigurationError::invalid_value(
                "equipment.min_floor",
                equipment.min_floor,
                "must not exceed equipment.max_floor",
            ));
        }

        if self.store.application_prefix.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "store.application_prefix",
                "",
                "application prefix cannot be empty",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                0,
                "channel capacity must be greater than 0",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                0,
                "pool size must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PremisesConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_temperature_range_rejected() {
        let mut config = PremisesConfig::default();
        config.equipment.min_temperature_c = 35.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("equipment.min_temperature_c"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = PremisesConfig::default();
        config.events.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_prefix_rejected() {
        let mut config = PremisesConfig::default();
        config.store.application_prefix = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
