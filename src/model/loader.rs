//! Reading model artifacts from disk.
//!
//! The header (`format`, `format_version`) is checked before the body is
//! decoded, so an artifact written by a newer or older exporter is reported
//! as [`ModelLoadError::Incompatible`] even when its body no longer matches
//! this build's schema.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::{ForestModel, TrendModel};

/// Default artifact filename, resolved against the working directory.
pub const DEFAULT_MODEL_FILE: &str = "rf_model.json";
/// Format tag every artifact must carry.
pub const ARTIFACT_FORMAT: &str = "trendcast-forest";
/// Artifact format version this build can decode.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Closed set of reasons a model could not be loaded.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// The artifact was written for a different format version.
    #[error(
        "Model at {path} uses format version {found}, but this build reads version {supported}"
    )]
    Incompatible {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
    /// The artifact file could not be read.
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact is not valid JSON or does not match the model schema.
    #[error("Invalid model file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The artifact is not a trend model at all.
    #[error("{path} is not a trend model (format '{found}')")]
    UnknownFormat { path: PathBuf, found: String },
    /// The artifact decoded but its structure is inconsistent.
    #[error("Model {path} is malformed: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

impl ModelLoadError {
    /// True for the version-mismatch class that needs a re-export to fix.
    pub fn is_incompatible(&self) -> bool {
        matches!(self, ModelLoadError::Incompatible { .. })
    }
}

/// Produces a ready-to-use model for one prediction request.
pub trait ModelSource {
    /// Load a model. Called once per request; implementations must not cache.
    fn load(&self) -> Result<Box<dyn TrendModel>, ModelLoadError>;

    /// Human-readable description of where the model comes from.
    fn describe(&self) -> String;
}

/// Loads a [`ForestModel`] from a JSON artifact on every call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileModelSource {
    path: PathBuf,
}

impl FileModelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the artifact.
    pub fn load_forest(&self) -> Result<ForestModel, ModelLoadError> {
        let bytes = std::fs::read(&self.path).map_err(|source| ModelLoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        decode_forest(&self.path, &bytes)
    }
}

impl Default for FileModelSource {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_FILE)
    }
}

impl ModelSource for FileModelSource {
    fn load(&self) -> Result<Box<dyn TrendModel>, ModelLoadError> {
        let model = self.load_forest()?;
        debug!(
            "Loaded model {} ({} trees, {} classes)",
            self.path.display(),
            model.trees.len(),
            model.classes.len()
        );
        Ok(Box::new(model))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Deserialize)]
struct ArtifactHeader {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    format_version: Option<u32>,
}

fn decode_forest(path: &Path, bytes: &[u8]) -> Result<ForestModel, ModelLoadError> {
    let parse_error = |source: serde_json::Error| ModelLoadError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let header: ArtifactHeader = serde_json::from_slice(bytes).map_err(parse_error)?;
    let format = header.format.unwrap_or_default();
    if format != ARTIFACT_FORMAT {
        return Err(ModelLoadError::UnknownFormat {
            path: path.to_path_buf(),
            found: format,
        });
    }
    let found = header.format_version.unwrap_or(0);
    if found != SUPPORTED_FORMAT_VERSION {
        return Err(ModelLoadError::Incompatible {
            path: path.to_path_buf(),
            found,
            supported: SUPPORTED_FORMAT_VERSION,
        });
    }
    let model: ForestModel = serde_json::from_slice(bytes).map_err(parse_error)?;
    model.validate().map_err(|reason| ModelLoadError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(model)
}
