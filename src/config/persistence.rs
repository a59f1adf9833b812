use crate::error::{MdError, Result};
use std::path::Path;

use crate::config::paths::*;
use crate::config::schema::*;

/// Load the configuration from the default location, falling back to an
/// empty cluster when no file exists yet.
pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;
    if !config_path.exists() {
        tracing::debug!("No config file at {}, using defaults", config_path.display());
        let config = Config::default();
        validate_config(&config)?;
        return Ok(config);
    }
    load_config_from(&config_path)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let toml_content = std::fs::read_to_string(path).map_err(|e| {
        MdError::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&toml_content)
        .map_err(|e| MdError::Config(format!("Failed to parse config: {}", e)))?;

    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            MdError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| MdError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, toml_str)
        .map_err(|e| MdError::Config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}
