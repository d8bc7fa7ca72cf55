//! Form state read by the egui renderer.

use std::path::PathBuf;

use crate::features::{FeatureTable, InputMode, ManualInput};
use crate::predict::{Banner, RenderInstructions};

/// Top-level UI model consumed by the renderer.
#[derive(Clone, Debug, Default)]
pub struct FormState {
    pub mode: InputMode,
    pub manual: ManualInput,
    pub upload: UploadState,
    /// Model artifact used for the next click.
    pub model_path: PathBuf,
    /// Output of the last predict click, cleared when inputs change mode.
    pub result: Option<RenderInstructions>,
    /// Non-prediction messages (upload or settings problems).
    pub notice: Option<Banner>,
}

/// The chosen upload file, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadState {
    pub file_name: Option<String>,
    /// Parsed rows; `None` until a file parses successfully.
    pub table: Option<FeatureTable>,
    /// Why the chosen file was rejected, if it was.
    pub rejection: Option<String>,
}

impl UploadState {
    /// One-line summary shown under the upload button.
    pub fn summary(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        Some(match &self.table {
            Some(table) => format!(
                "{name}: {} row(s), {} column(s)",
                table.row_count(),
                table.column_count()
            ),
            None => match &self.rejection {
                Some(reason) => format!("{name}: rejected ({reason})"),
                None => format!("{name}: not loaded"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_shape_or_failure() {
        assert_eq!(UploadState::default().summary(), None);
        let loaded = UploadState {
            file_name: Some("spy.csv".into()),
            table: FeatureTable::new(vec!["a".into(), "b".into()], vec![vec![1.0, 2.0]]),
            rejection: None,
        };
        assert_eq!(
            loaded.summary().as_deref(),
            Some("spy.csv: 1 row(s), 2 column(s)")
        );
        let failed = UploadState {
            file_name: Some("bad.csv".into()),
            table: None,
            rejection: None,
        };
        assert_eq!(failed.summary().as_deref(), Some("bad.csv: not loaded"));
        let rejected = UploadState {
            rejection: Some("line 2 has 1 field(s)".into()),
            ..failed
        };
        assert_eq!(
            rejected.summary().as_deref(),
            Some("bad.csv: rejected (line 2 has 1 field(s))")
        );
    }
}
