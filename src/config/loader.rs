//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ShimConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Store domain override, named after the Hydrogen environment variable.
pub const ENV_STORE_DOMAIN: &str = "PUBLIC_STORE_DOMAIN";
/// Storefront API token override.
pub const ENV_STOREFRONT_TOKEN: &str = "PUBLIC_STOREFRONT_API_TOKEN";
/// Storefront API version override.
pub const ENV_STOREFRONT_VERSION: &str = "PUBLIC_STOREFRONT_API_VERSION";
/// Listener bind address override.
pub const ENV_BIND_ADDRESS: &str = "SHIM_BIND_ADDRESS";
/// Public origin override.
pub const ENV_PUBLIC_ORIGIN: &str = "SHIM_PUBLIC_ORIGIN";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied after parsing and before validation.
pub fn load_config(path: &Path) -> Result<ShimConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ShimConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load from `path` when given, otherwise start from defaults plus environment.
pub fn load_or_default(path: Option<&Path>) -> Result<ShimConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = ShimConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Overlay environment values onto a parsed config.
///
/// `lookup` is injected so tests don't have to touch the process environment.
pub fn apply_env_overrides<F>(config: &mut ShimConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(domain) = non_empty(ENV_STORE_DOMAIN) {
        config.storefront.store_domain = domain;
    }
    if let Some(token) = non_empty(ENV_STOREFRONT_TOKEN) {
        config.storefront.public_access_token = Some(token);
    }
    if let Some(version) = non_empty(ENV_STOREFRONT_VERSION) {
        config.storefront.api_version = version;
    }
    if let Some(bind) = non_empty(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind;
    }
    if let Some(origin) = non_empty(ENV_PUBLIC_ORIGIN) {
        config.listener.public_origin = Some(origin);
    }
}
