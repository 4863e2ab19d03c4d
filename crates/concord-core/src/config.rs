//! Config file location, loading, and atomic saving.

use std::fs;
use std::path::{Path, PathBuf};

use concord_types::{AppConfig, ConfigError};

pub const CONFIG_FILE: &str = "concord.json";
const DATA_DIR_ENV: &str = "CONCORD_DATA_DIR";
const DATA_DIR_NAME: &str = "concord";

/// Get the data directory path, creating it if needed.
///
/// `CONCORD_DATA_DIR` overrides the platform data directory.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = if let Ok(custom_dir) = std::env::var(DATA_DIR_ENV) {
        PathBuf::from(custom_dir)
    } else {
        dirs::data_dir()
            .ok_or_else(|| ConfigError::DataDir { message: "Cannot get data directory".into() })?
            .join(DATA_DIR_NAME)
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| ConfigError::DataDir {
            message: format!("Failed to create data directory: {}", e),
        })?;
    }

    Ok(data_dir)
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Load the config from the data directory.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_path()?)
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("[Config] {} not found, using defaults", path.display());
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let config: AppConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?;
    config.validate_all()?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path()?, config)
}

/// Validate, then write through a temp file and rename.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    config.validate_all()?;

    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to serialize config: {}", e),
    })?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to write temp config: {}", e),
    })?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        message: format!("Failed to save config: {}", e),
    })
}

/// Update specific fields in the config.
pub fn update_config<F>(updater: F) -> Result<AppConfig, ConfigError>
where
    F: FnOnce(&mut AppConfig),
{
    let mut config = load_config()?;
    updater(&mut config);
    save_config(&config)?;
    Ok(config)
}
