//! Per-click prediction handler.
//!
//! [`handle`] turns an explicit [`PredictRequest`] and a [`ModelSource`] into
//! [`RenderInstructions`]. Nothing is cached between calls: every click
//! rebuilds the table and reloads the model.

use std::error::Error as StdError;

use tracing::{error, info, warn};

use crate::features::{FeatureTable, InputMode, ManualInput};
use crate::model::{ModelLoadError, ModelSource, PredictError};

/// Warning shown when there is nothing to predict on.
pub const EMPTY_INPUT_MESSAGE: &str = "Please provide valid input data.";
/// Title drawn above the importance bars.
pub const CHART_TITLE: &str = "Feature Importance";
/// Axis label for bar lengths.
pub const CHART_X_LABEL: &str = "Importance";

/// Everything the handler needs from the form for one click.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredictRequest {
    pub mode: InputMode,
    pub manual: ManualInput,
    /// Parsed upload, `None` until a file has been chosen.
    pub upload: Option<FeatureTable>,
}

impl PredictRequest {
    /// Table for the active mode, or `None` when no usable rows exist.
    pub fn table(&self) -> Option<FeatureTable> {
        let table = match self.mode {
            InputMode::Manual => Some(self.manual.to_table()),
            InputMode::Upload => self.upload.clone(),
        };
        table.filter(|table| !table.is_empty())
    }
}

/// One bar of the importance chart.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportanceBar {
    pub feature: String,
    pub importance: f64,
}

/// Horizontal bar chart pairing input columns with model importances.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportanceChart {
    pub title: String,
    pub x_label: String,
    /// One bar per input column, in input-column order.
    pub bars: Vec<ImportanceBar>,
}

impl ImportanceChart {
    /// Pair `columns` with `importances` by position.
    ///
    /// The pairing uses the table's column order, not the model's training
    /// order; a table with reordered columns gets mislabeled bars.
    pub fn from_columns(columns: &[String], importances: &[f64]) -> Result<Self, PredictError> {
        if columns.len() != importances.len() {
            return Err(PredictError::ImportanceLengthMismatch {
                columns: columns.len(),
                importances: importances.len(),
            });
        }
        let bars = columns
            .iter()
            .zip(importances)
            .map(|(feature, &importance)| ImportanceBar {
                feature: feature.clone(),
                importance,
            })
            .collect();
        Ok(Self {
            title: CHART_TITLE.to_string(),
            x_label: CHART_X_LABEL.to_string(),
            bars,
        })
    }

    /// Largest importance, used to scale bars. Never below zero.
    pub fn max_importance(&self) -> f64 {
        self.bars
            .iter()
            .map(|bar| bar.importance)
            .filter(|value| value.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Result of one click before it is turned into banners.
#[derive(Debug)]
pub enum PredictOutcome {
    /// No table or zero rows. The model was not loaded.
    EmptyInput,
    /// Label of the first row plus the importance chart.
    Success {
        label: String,
        row_count: usize,
        chart: ImportanceChart,
    },
    /// The model could not be loaded.
    LoadFailed(ModelLoadError),
    /// Inference or chart building failed.
    PredictFailed {
        error: PredictError,
        trace: String,
    },
}

/// Run the pipeline for one click.
pub fn run(request: &PredictRequest, source: &dyn ModelSource) -> PredictOutcome {
    let Some(table) = request.table() else {
        warn!("Prediction requested without input rows ({:?} mode)", request.mode);
        return PredictOutcome::EmptyInput;
    };

    let model = match source.load() {
        Ok(model) => model,
        Err(err) => {
            warn!("Model load failed: {err}");
            return PredictOutcome::LoadFailed(err);
        }
    };

    let predicted = model.predict(&table).and_then(|labels| {
        let label = labels.into_iter().next().ok_or(PredictError::NoPredictions)?;
        let chart = ImportanceChart::from_columns(table.columns(), model.feature_importances())?;
        Ok((label, chart))
    });

    match predicted {
        Ok((label, chart)) => {
            info!(
                "Predicted trend {label} from {} row(s) using {}",
                table.row_count(),
                source.describe()
            );
            PredictOutcome::Success {
                label,
                row_count: table.row_count(),
                chart,
            }
        }
        Err(err) => {
            error!("Prediction failed: {err}");
            let trace = diagnostic_trace(&err, &table, source);
            PredictOutcome::PredictFailed { error: err, trace }
        }
    }
}

/// Severity of a banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerTone {
    Success,
    Warning,
    Error,
}

/// A single message line shown after a click.
#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub tone: BannerTone,
    pub text: String,
}

impl Banner {
    fn new(tone: BannerTone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

/// What the window should draw after a click.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderInstructions {
    pub banner: Banner,
    pub chart: Option<ImportanceChart>,
    /// Diagnostic detail for prediction failures.
    pub trace: Option<String>,
}

impl From<PredictOutcome> for RenderInstructions {
    fn from(outcome: PredictOutcome) -> Self {
        match outcome {
            PredictOutcome::EmptyInput => Self {
                banner: Banner::new(BannerTone::Warning, EMPTY_INPUT_MESSAGE),
                chart: None,
                trace: None,
            },
            PredictOutcome::Success { label, chart, .. } => Self {
                banner: Banner::new(BannerTone::Success, format!("Predicted Trend: {label}")),
                chart: Some(chart),
                trace: None,
            },
            PredictOutcome::LoadFailed(err) => Self {
                banner: Banner::new(BannerTone::Error, load_failure_message(&err)),
                chart: None,
                trace: None,
            },
            PredictOutcome::PredictFailed { error, trace } => Self {
                banner: Banner::new(BannerTone::Error, format!("Prediction failed: {error}")),
                chart: None,
                trace: Some(trace),
            },
        }
    }
}

/// Run one click and convert the outcome into render instructions.
pub fn handle(request: &PredictRequest, source: &dyn ModelSource) -> RenderInstructions {
    run(request, source).into()
}

/// Banner text for a load failure.
///
/// Version mismatches get remediation advice; everything else carries the
/// underlying error text.
pub fn load_failure_message(err: &ModelLoadError) -> String {
    match err {
        ModelLoadError::Incompatible {
            found, supported, ..
        } => format!(
            "The model file was exported in an incompatible format (version {found}, this app \
             reads version {supported}). Re-export the model with a matching trainer version \
             and try again."
        ),
        other => format!("Error loading model: {other}"),
    }
}

fn diagnostic_trace(err: &PredictError, table: &FeatureTable, source: &dyn ModelSource) -> String {
    let mut lines = vec![format!("Error: {err}")];
    let mut cause = err.source();
    while let Some(inner) = cause {
        lines.push(format!("Caused by: {inner}"));
        cause = inner.source();
    }
    lines.push(format!("Model: {}", source.describe()));
    lines.push(format!(
        "Input: {} row(s) x {} column(s) [{}]",
        table.row_count(),
        table.column_count(),
        table.columns().join(", ")
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;

    use super::*;
    use crate::features::MANUAL_COLUMNS;
    use crate::model::TrendModel;
    use crate::model::forest::tests::sample_forest;

    struct FixedModel {
        labels: Vec<String>,
        importances: Vec<f64>,
    }

    impl TrendModel for FixedModel {
        fn predict(&self, table: &FeatureTable) -> Result<Vec<String>, PredictError> {
            Ok(self
                .labels
                .iter()
                .cycle()
                .take(table.row_count())
                .cloned()
                .collect())
        }

        fn feature_importances(&self) -> &[f64] {
            &self.importances
        }
    }

    enum Behavior {
        Fixed(Vec<&'static str>, Vec<f64>),
        Forest,
        Incompatible,
        Missing,
    }

    struct StubSource {
        behavior: Behavior,
        loads: Cell<usize>,
    }

    impl StubSource {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                loads: Cell::new(0),
            }
        }
    }

    impl ModelSource for StubSource {
        fn load(&self) -> Result<Box<dyn TrendModel>, ModelLoadError> {
            self.loads.set(self.loads.get() + 1);
            match &self.behavior {
                Behavior::Fixed(labels, importances) => Ok(Box::new(FixedModel {
                    labels: labels.iter().map(|label| label.to_string()).collect(),
                    importances: importances.clone(),
                })),
                Behavior::Forest => Ok(Box::new(sample_forest())),
                Behavior::Incompatible => Err(ModelLoadError::Incompatible {
                    path: PathBuf::from("rf_model.json"),
                    found: 3,
                    supported: 1,
                }),
                Behavior::Missing => Err(ModelLoadError::Read {
                    path: PathBuf::from("rf_model.json"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                }),
            }
        }

        fn describe(&self) -> String {
            "stub".to_string()
        }
    }

    fn upload(columns: &[&str], rows: Vec<Vec<f64>>) -> PredictRequest {
        PredictRequest {
            mode: InputMode::Upload,
            manual: ManualInput::default(),
            upload: FeatureTable::new(columns.iter().map(|c| c.to_string()).collect(), rows),
        }
    }

    #[test]
    fn manual_scenario_renders_label_and_four_bars() {
        let request = PredictRequest {
            mode: InputMode::Manual,
            manual: ManualInput {
                close: 100.0,
                volume: 5000.0,
                volatility: 0.25,
                lag1_return: 0.5,
            },
            upload: None,
        };
        let source = StubSource::new(Behavior::Fixed(vec!["Bullish"], vec![0.4, 0.3, 0.2, 0.1]));

        let render = handle(&request, &source);

        assert_eq!(render.banner.tone, BannerTone::Success);
        assert_eq!(render.banner.text, "Predicted Trend: Bullish");
        let chart = render.chart.expect("chart");
        assert_eq!(chart.title, "Feature Importance");
        assert_eq!(chart.x_label, "Importance");
        let bars: Vec<(&str, f64)> = chart
            .bars
            .iter()
            .map(|bar| (bar.feature.as_str(), bar.importance))
            .collect();
        assert_eq!(
            bars,
            vec![
                ("close", 0.4),
                ("volume", 0.3),
                ("volatility", 0.2),
                ("lag1_return", 0.1),
            ]
        );
        assert_eq!(render.trace, None);
    }

    #[test]
    fn missing_upload_warns_without_loading_model() {
        let request = PredictRequest {
            mode: InputMode::Upload,
            ..PredictRequest::default()
        };
        let source = StubSource::new(Behavior::Forest);
        let render = handle(&request, &source);
        assert_eq!(render.banner.tone, BannerTone::Warning);
        assert_eq!(render.banner.text, EMPTY_INPUT_MESSAGE);
        assert_eq!(render.chart, None);
        assert_eq!(source.loads.get(), 0);
    }

    #[test]
    fn header_only_upload_warns_without_loading_model() {
        let request = upload(&MANUAL_COLUMNS, Vec::new());
        let source = StubSource::new(Behavior::Forest);
        assert!(matches!(run(&request, &source), PredictOutcome::EmptyInput));
        assert_eq!(source.loads.get(), 0);
    }

    #[test]
    fn upload_mode_ignores_manual_values() {
        let mut request = upload(&["a", "b"], vec![vec![1.0, 2.0]]);
        request.manual.close = 55.0;
        let table = request.table().unwrap();
        assert_eq!(table.columns(), ["a", "b"]);
    }

    #[test]
    fn only_first_row_label_is_reported() {
        let request = upload(
            &["a", "b"],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
        );
        let source = StubSource::new(Behavior::Fixed(
            vec!["Bearish", "Bullish", "Stable"],
            vec![0.5, 0.5],
        ));
        match run(&request, &source) {
            PredictOutcome::Success {
                label, row_count, ..
            } => {
                assert_eq!(label, "Bearish");
                assert_eq!(row_count, 3);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn forest_multi_row_upload_reports_row_zero() {
        let request = upload(
            &MANUAL_COLUMNS,
            vec![vec![1.0, 1.0, 0.1, -2.0], vec![1.0, 1.0, 0.1, 2.0]],
        );
        let render = handle(&request, &StubSource::new(Behavior::Forest));
        assert_eq!(render.banner.text, "Predicted Trend: Stable");
    }

    #[test]
    fn incompatible_model_gets_remediation_message() {
        let source = StubSource::new(Behavior::Incompatible);
        let render = handle(&PredictRequest::default(), &source);
        assert_eq!(render.banner.tone, BannerTone::Error);
        assert!(render.banner.text.contains("incompatible format"));
        assert!(render.banner.text.contains("Re-export"));
        assert!(!render.banner.text.starts_with("Error loading model"));
        assert_eq!(source.loads.get(), 1);
    }

    #[test]
    fn other_load_failures_get_generic_message_with_cause() {
        let render = handle(
            &PredictRequest::default(),
            &StubSource::new(Behavior::Missing),
        );
        assert_eq!(render.banner.tone, BannerTone::Error);
        assert!(render.banner.text.starts_with("Error loading model: "));
        assert!(render.banner.text.contains("no such file"));
        assert_eq!(render.trace, None);
    }

    #[test]
    fn column_mismatch_is_a_prediction_failure_with_trace() {
        let request = upload(&["close", "volume"], vec![vec![1.0, 2.0]]);
        let render = handle(&request, &StubSource::new(Behavior::Forest));
        assert_eq!(render.banner.tone, BannerTone::Error);
        assert_eq!(
            render.banner.text,
            "Prediction failed: Model expects 4 features but the input has 2 columns"
        );
        let trace = render.trace.expect("trace");
        assert!(trace.starts_with("Error: Model expects 4 features"));
        assert!(trace.contains("Model: stub"));
        assert!(trace.contains("[close, volume]"));
    }

    #[test]
    fn importance_length_mismatch_is_a_prediction_failure() {
        let request = upload(&["a", "b", "c"], vec![vec![1.0, 2.0, 3.0]]);
        let source = StubSource::new(Behavior::Fixed(vec!["Stable"], vec![0.5, 0.5]));
        match run(&request, &source) {
            PredictOutcome::PredictFailed { error, .. } => assert_eq!(
                error,
                PredictError::ImportanceLengthMismatch {
                    columns: 3,
                    importances: 2,
                }
            ),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn chart_follows_input_column_order() {
        let columns: Vec<String> = ["volume", "close"].iter().map(|c| c.to_string()).collect();
        let chart = ImportanceChart::from_columns(&columns, &[0.7, 0.3]).unwrap();
        assert_eq!(chart.bars.len(), 2);
        assert_eq!(chart.bars[0].feature, "volume");
        assert_eq!(chart.bars[1].feature, "close");
        assert_eq!(chart.max_importance(), 0.7);
    }

    #[test]
    fn max_importance_ignores_negative_and_non_finite() {
        let columns: Vec<String> = ["a", "b"].iter().map(|c| c.to_string()).collect();
        let chart = ImportanceChart::from_columns(&columns, &[-1.0, f64::NAN]).unwrap();
        assert_eq!(chart.max_importance(), 0.0);
    }
}
