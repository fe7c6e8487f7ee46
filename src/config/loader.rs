//! Configuration Loader
//!
//! Environment-aware configuration loading on top of the `config` crate.
//! Sources are layered lowest to highest precedence:
//!
//! 1. Built-in defaults ([`PremisesConfig::default`])
//! 2. `<dir>/premises.toml` (optional)
//! 3. `<dir>/premises.<environment>.toml` (optional)
//! 4. `PREMISES__SECTION__FIELD` environment variables

use super::error::ConfigResult;
use super::PremisesConfig;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_FILE_STEM: &str = "premises";
const ENV_PREFIX: &str = "PREMISES";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: PremisesConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection from `./config`
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(PathBuf::from("config"))
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: PathBuf) -> ConfigResult<Arc<ConfigManager>> {
        let environment = crate::logging::get_environment().to_lowercase();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for tests that must not touch process-wide environment variables.
    pub fn load_from_directory_with_env(
        config_dir: PathBuf,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_dir.display()
        );

        let base = config_dir.join(format!("{BASE_FILE_STEM}.toml"));
        let overlay = config_dir.join(format!("{BASE_FILE_STEM}.{environment}.toml"));

        let config: PremisesConfig = Config::builder()
            .add_source(Config::try_from(&PremisesConfig::default())?)
            .add_source(File::from(base).required(false))
            .add_source(File::from(overlay).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        info!(
            environment = environment,
            config = %Self::sanitize_config_for_logging(&config),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: config_dir,
        }))
    }

    /// Load a single explicit file over the defaults (no environment overlay).
    pub fn load_from_path(path: &Path) -> ConfigResult<Arc<ConfigManager>> {
        let config: PremisesConfig = Config::builder()
            .add_source(Config::try_from(&PremisesConfig::default())?)
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        Ok(Arc::new(ConfigManager {
            config,
            environment: crate::logging::get_environment().to_lowercase(),
            config_directory: path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }))
    }

    /// Wrap an already-built configuration, validating it first.
    pub fn from_config(config: PremisesConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: crate::logging::get_environment().to_lowercase(),
            config_directory: PathBuf::from("config"),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &PremisesConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Configuration as JSON with credentials masked, for logs
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    fn sanitize_config_for_logging(config: &PremisesConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        if let Some(url) = config_json
            .get_mut("database")
            .and_then(|database| database.get_mut("url"))
        {
            *url = serde_json::Value::String(mask_credentials(url.as_str().unwrap_or_default()));
        }
        config_json
    }
}

/// Replace the password segment of a connection URL.
fn mask_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
