//! User settings persisted as TOML under the app root.
//!
//! Missing files and missing keys fall back to defaults, so a fresh install
//! reads `rf_model.json` from the working directory and opens in manual mode.

mod errors;
mod load;
mod save;


use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::features::InputMode;
use crate::model::{DEFAULT_MODEL_FILE, FileModelSource};

pub use crate::app_dirs::SETTINGS_FILE_NAME;
pub use errors::ConfigError;
pub use load::{load_from, load_in};
pub use save::save_to_path;

/// Persisted user preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Model artifact to load on each prediction. Relative paths resolve
    /// against the working directory.
    pub model_path: PathBuf,
    /// Input mode selected when the window opens.
    pub default_mode: InputMode,
    /// Folder the upload dialog starts in.
    pub last_upload_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_FILE),
            default_mode: InputMode::Manual,
            last_upload_dir: None,
        }
    }
}

impl AppSettings {
    /// Replace blank values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.model_path.as_os_str().is_empty() {
            self.model_path = PathBuf::from(DEFAULT_MODEL_FILE);
        }
        if self
            .last_upload_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            self.last_upload_dir = None;
        }
        self
    }

    /// Model source for the configured artifact path.
    pub fn model_source(&self) -> FileModelSource {
        FileModelSource::new(self.model_path.clone())
    }
}
