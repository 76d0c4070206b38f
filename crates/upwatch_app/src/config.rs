//! Loads `Settings` from the JSON config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use upwatch_core::{Settings, SettingsError};
use upwatch_logging::watch_info;

pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0:?} not found; copy config.example.json to config.json and edit it")]
    Missing(PathBuf),
    #[error("failed to read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("config file {path:?} is not valid JSON for upwatch: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("config file {path:?} is incomplete: {source}")]
    Invalid { path: PathBuf, source: SettingsError },
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let settings: Settings = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    watch_info!("Loaded config from {:?}", path);
    Ok(settings)
}
