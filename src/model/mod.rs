//! Trend classifiers and the artifact loader.
//!
//! The predictor only needs two things from a model: one label per input row
//! and a per-feature importance score. [`TrendModel`] captures that, and
//! [`ModelSource`] hands out a freshly loaded model on every request.

pub(crate) mod forest;
mod loader;

pub use forest::{ForestModel, Node, Tree};
pub use loader::{
    ARTIFACT_FORMAT, DEFAULT_MODEL_FILE, FileModelSource, ModelLoadError, ModelSource,
    SUPPORTED_FORMAT_VERSION,
};

use thiserror::Error;

use crate::features::FeatureTable;

/// Failures raised while a loaded model runs inference.
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    /// The table does not have as many columns as the model was trained on.
    #[error("Model expects {expected} features but the input has {found} columns")]
    FeatureCountMismatch { expected: usize, found: usize },
    /// A cell was missing or not finite.
    #[error("Input contains a missing or non-finite value at row {row}, column '{column}'")]
    NonFiniteValue { row: usize, column: String },
    /// Importances could not be paired one-to-one with the input columns.
    #[error("Model reports {importances} feature importances for {columns} input columns")]
    ImportanceLengthMismatch { columns: usize, importances: usize },
    /// The model produced no labels.
    #[error("Model returned no predictions")]
    NoPredictions,
}

/// A pre-trained classifier that maps feature rows to trend labels.
pub trait TrendModel {
    /// Predict one label per row of `table`.
    fn predict(&self, table: &FeatureTable) -> Result<Vec<String>, PredictError>;

    /// Importance per feature, aligned with the model's own feature order.
    fn feature_importances(&self) -> &[f64];
}
