use std::path::Path;

use serde::de::Error as SerdeDeError;

use crate::app_dirs::AppDirs;

use super::{AppSettings, ConfigError};

/// Create the app folder if needed and load its settings file.
pub fn load_in(dirs: &AppDirs) -> Result<AppSettings, ConfigError> {
    dirs.ensure()?;
    load_from(&dirs.settings_file())
}

/// Load settings from an explicit path, returning defaults if it does not exist.
pub fn load_from(path: &Path) -> Result<AppSettings, ConfigError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppSettings::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let parse_error = |source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    };
    let text = String::from_utf8(bytes).map_err(|err| parse_error(SerdeDeError::custom(err)))?;
    toml::from_str::<AppSettings>(&text)
        .map(AppSettings::normalized)
        .map_err(parse_error)
}
