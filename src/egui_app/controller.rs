//! Bridges form state, settings and the predict handler.

use std::path::{Path, PathBuf};

use rfd::FileDialog;
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::egui_app::state::{FormState, UploadState};
use crate::features::{self, InputMode, ManualInput};
use crate::model::ModelSource;
use crate::predict::{
    self, Banner, BannerTone, EMPTY_INPUT_MESSAGE, PredictOutcome, PredictRequest,
    RenderInstructions,
};
use crate::settings::{self, AppSettings, ConfigError};

/// Owns the form state and applies user actions to it.
pub struct FormController {
    pub ui: FormState,
    settings: AppSettings,
    /// Where settings are persisted; `None` keeps changes in memory only.
    settings_file: Option<PathBuf>,
}

impl FormController {
    /// Build a controller from already-loaded settings.
    pub fn new(settings: AppSettings, settings_file: Option<PathBuf>) -> Self {
        let ui = FormState {
            mode: settings.default_mode,
            model_path: settings.model_path.clone(),
            ..FormState::default()
        };
        Self {
            ui,
            settings,
            settings_file,
        }
    }

    /// Load settings from `dirs` and save later changes back there.
    pub fn load_configuration_in(dirs: &AppDirs) -> Result<Self, ConfigError> {
        let settings = settings::load_in(dirs)?;
        let path = dirs.settings_file();
        info!(
            "Settings loaded from {} (model: {})",
            path.display(),
            settings.model_path.display()
        );
        Ok(Self::new(settings, Some(path)))
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Switch between manual entry and upload.
    pub fn set_mode(&mut self, mode: InputMode) {
        if self.ui.mode == mode {
            return;
        }
        self.ui.mode = mode;
        self.ui.result = None;
        self.ui.notice = None;
    }

    /// Replace the manual values, applying the widget bounds.
    pub fn set_manual(&mut self, manual: ManualInput) {
        self.ui.manual = manual.clamped();
    }

    /// Snapshot of the inputs for one click.
    pub fn request(&self) -> PredictRequest {
        PredictRequest {
            mode: self.ui.mode,
            manual: self.ui.manual,
            upload: self.ui.upload.table.clone(),
        }
    }

    /// Run a prediction with the configured model file.
    pub fn predict(&mut self) {
        let source = self.settings.model_source();
        self.predict_with(&source);
    }

    /// Run a prediction against an explicit model source.
    ///
    /// The result banner replaces any earlier notice. When an upload was
    /// rejected, the empty-input warning names the file and the reason.
    pub fn predict_with(&mut self, source: &dyn ModelSource) {
        let request = self.request();
        let outcome = predict::run(&request, source);
        let empty = matches!(outcome, PredictOutcome::EmptyInput);
        let mut render = RenderInstructions::from(outcome);
        if empty
            && self.ui.mode == InputMode::Upload
            && let (Some(name), Some(reason)) =
                (&self.ui.upload.file_name, &self.ui.upload.rejection)
        {
            render.banner.text = format!("{EMPTY_INPUT_MESSAGE} {name} was rejected: {reason}");
        }
        self.ui.notice = None;
        self.ui.result = Some(render);
    }

    /// Parse uploaded bytes and make them the active upload.
    ///
    /// A parse failure clears the upload so the next click warns about
    /// missing input.
    pub fn upload_bytes(&mut self, file_name: impl Into<String>, bytes: &[u8]) {
        let file_name = file_name.into();
        self.ui.result = None;
        match features::parse_table(bytes) {
            Ok(table) => {
                info!(
                    "Loaded upload {file_name}: {} row(s), {} column(s)",
                    table.row_count(),
                    table.column_count()
                );
                self.ui.notice = None;
                self.ui.upload = UploadState {
                    file_name: Some(file_name),
                    table: Some(table),
                    rejection: None,
                };
            }
            Err(err) => {
                warn!("Rejected upload {file_name}: {err}");
                self.ui.notice = Some(error_banner(format!("Could not read {file_name}: {err}")));
                self.ui.upload = UploadState {
                    file_name: Some(file_name),
                    table: None,
                    rejection: Some(err.to_string()),
                };
            }
        }
    }

    /// Read a CSV file from disk and make it the active upload.
    pub fn upload_from_path(&mut self, path: &Path) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(bytes) => self.upload_bytes(file_name, &bytes),
            Err(err) => {
                warn!("Failed to read upload {}: {err}", path.display());
                self.ui.notice = Some(error_banner(format!("Could not read {file_name}: {err}")));
                self.ui.upload = UploadState {
                    file_name: Some(file_name),
                    table: None,
                    rejection: Some(err.to_string()),
                };
            }
        }
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty())
            && self.settings.last_upload_dir.as_deref() != Some(dir)
        {
            self.settings.last_upload_dir = Some(dir.to_path_buf());
            self.persist_settings();
        }
    }

    /// Forget the current upload.
    pub fn clear_upload(&mut self) {
        self.ui.upload = UploadState::default();
        self.ui.result = None;
        self.ui.notice = None;
    }

    /// Pick a CSV through the native file dialog.
    pub fn upload_via_dialog(&mut self) {
        let mut dialog = FileDialog::new().add_filter("CSV", &["csv"]);
        if let Some(dir) = &self.settings.last_upload_dir {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.upload_from_path(&path);
        }
    }

    /// Pick a model artifact through the native file dialog.
    pub fn choose_model_via_dialog(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("Trend model", &["json"])
            .pick_file()
        {
            self.set_model_path(path);
        }
    }

    /// Use a different model artifact for subsequent clicks and remember it.
    pub fn set_model_path(&mut self, path: PathBuf) {
        info!("Model path set to {}", path.display());
        self.settings.model_path = path.clone();
        self.ui.model_path = path;
        self.ui.result = None;
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        let Some(path) = &self.settings_file else {
            return;
        };
        if let Err(err) = settings::save_to_path(&self.settings, path) {
            warn!("Failed to save settings: {err}");
            self.ui.notice = Some(Banner {
                tone: BannerTone::Warning,
                text: format!("Settings were not saved: {err}"),
            });
        }
    }
}

fn error_banner(text: String) -> Banner {
    Banner {
        tone: BannerTone::Error,
        text,
    }
}
