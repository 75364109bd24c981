//! Configuration for the licence generator.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `licence.toml` file (or an explicit path)
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `LICENCE_KEY_PATH` - Path to the issuer's hex-encoded private key
//! - `LICENCE_MAX_COUNT` - Default usage ceiling for new licences (0 = unlimited)
//! - `LICENCE_LOGGING_ENABLED` - Enable diagnostic logging on stderr
//! - `LICENCE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::sync::OnceLock;

use crate::errors::{LicenceError, LicenceResult};
use crate::logging::parse_level;

/// Global configuration singleton.
static CONFIG: OnceLock<LicenceConfig> = OnceLock::new();

/// Default configuration file name (without extension).
const DEFAULT_CONFIG_FILE: &str = "licence";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LicenceConfig {
    /// Issuer configuration
    pub issuer: IssuerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Issuer configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Path to the private key used when `--key` is not given
    pub key_path: Option<String>,
    /// Usage ceiling used when `--maxcount` is not given (0 = unlimited)
    pub default_max_count: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

fn config_error(e: config::ConfigError) -> LicenceError {
    LicenceError::ConfigError(e.to_string())
}

impl LicenceConfig {
    /// Load configuration from `licence.toml` in the working directory
    /// (optional) and the environment.
    pub fn load() -> LicenceResult<Self> {
        let builder = Self::defaults()?
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
        Self::finish(builder)
    }

    /// Load configuration from an explicit file and the environment.
    ///
    /// Unlike [`LicenceConfig::load`], the file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> LicenceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LicenceError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let builder = Self::defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    fn defaults() -> LicenceResult<ConfigBuilder<DefaultState>> {
        Config::builder()
            .set_default("issuer.default_max_count", 0)
            .map_err(config_error)?
            .set_default("logging.enabled", false)
            .map_err(config_error)?
            .set_default("logging.level", "info")
            .map_err(config_error)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> LicenceResult<Self> {
        let builder = builder
            .set_override_option("issuer.key_path", env::var("LICENCE_KEY_PATH").ok())
            .map_err(config_error)?
            .set_override_option(
                "issuer.default_max_count",
                env::var("LICENCE_MAX_COUNT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_error)?
            .set_override_option(
                "logging.enabled",
                env::var("LICENCE_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_error)?
            .set_override_option("logging.level", env::var("LICENCE_LOG_LEVEL").ok())
            .map_err(config_error)?;

        let settings = builder
            .build()
            .map_err(|e| LicenceError::ConfigError(format!("failed to build config: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| LicenceError::ConfigError(format!("failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenceResult<()> {
        parse_level(&self.logging.level)?;

        if let Some(path) = &self.issuer.key_path {
            if path.trim().is_empty() {
                return Err(LicenceError::ConfigError(
                    "issuer.key_path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
pub fn get_config() -> LicenceResult<&'static LicenceConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = LicenceConfig::load()?;
    Ok(CONFIG.get_or_init(|| config))
}

/// Initialize the global configuration, from `path` if given.
///
/// Call this early in a binary to surface configuration errors. If the
/// configuration was already initialized, the existing value is returned.
pub fn init_config(path: Option<&Path>) -> LicenceResult<&'static LicenceConfig> {
    match path {
        Some(path) => {
            if let Some(config) = CONFIG.get() {
                return Ok(config);
            }
            let config = LicenceConfig::load_from(path)?;
            Ok(CONFIG.get_or_init(|| config))
        }
        None => get_config(),
    }
}
