//! Where trendcast keeps its files.
//!
//! Everything lives in one `.trendcast` folder under the OS config directory
//! (`%APPDATA%` on Windows, `~/.config` on Linux). `TRENDCAST_CONFIG_HOME`
//! replaces the OS config directory, which keeps portable installs and test
//! runs away from the real profile.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the config base.
pub const APP_DIR_NAME: &str = ".trendcast";
/// Environment variable that replaces the OS config directory.
pub const CONFIG_HOME_ENV: &str = "TRENDCAST_CONFIG_HOME";

const LOGS_DIR_NAME: &str = "logs";
/// Settings document inside the app folder.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory available; set TRENDCAST_CONFIG_HOME to choose one")]
    NoBaseDir,
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolved application folder and the files inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Resolve the folder from the environment, falling back to the OS
    /// config directory.
    pub fn resolve() -> Result<Self, AppDirError> {
        let base = config_base(std::env::var_os(CONFIG_HOME_ENV), || {
            BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
        })
        .ok_or(AppDirError::NoBaseDir)?;
        Ok(Self::under(base))
    }

    /// Use `base` as the config directory, ignoring the environment.
    pub fn under(base: impl AsRef<Path>) -> Self {
        Self {
            root: base.as_ref().join(APP_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR_NAME)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    /// Create the root and logs folders if they are missing.
    pub fn ensure(&self) -> Result<(), AppDirError> {
        let logs = self.logs_dir();
        std::fs::create_dir_all(&logs).map_err(|source| AppDirError::CreateDir {
            path: logs,
            source,
        })
    }
}

/// An empty override counts as unset.
fn config_base(
    override_dir: Option<OsString>,
    os_default: impl FnOnce() -> Option<PathBuf>,
) -> Option<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => os_default(),
    }
}
