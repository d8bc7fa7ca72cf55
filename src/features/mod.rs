//! Feature tables handed to the trend model.
//!
//! A [`FeatureTable`] comes from one of two mutually exclusive sources: the
//! manual form ([`ManualInput`]) or an uploaded CSV file ([`csv::parse_table`]).

pub mod csv;

use serde::{Deserialize, Serialize};

pub use csv::{CsvError, parse_table};

/// Column order produced by the manual form.
pub const MANUAL_COLUMNS: [&str; 4] = ["close", "volume", "volatility", "lag1_return"];

/// How the user supplies feature rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// One row typed into the form.
    #[default]
    Manual,
    /// Any number of rows read from a CSV file.
    Upload,
}

impl InputMode {
    /// Label shown on the mode radio button.
    pub fn label(self) -> &'static str {
        match self {
            InputMode::Manual => "Manual Input",
            InputMode::Upload => "Upload CSV",
        }
    }
}

/// Numeric observations keyed by column name.
///
/// Every row has exactly `columns.len()` values. No schema is enforced beyond
/// that; a table whose columns do not match the model fails inside the model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Build a table, returning `None` when a row width disagrees with the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != columns.len()) {
            return None;
        }
        Some(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to predict on.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Values typed into the manual form. Untouched fields stay at 0.0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualInput {
    /// Today's closing price.
    pub close: f64,
    /// Today's traded volume.
    pub volume: f64,
    /// Volatility in `0.0..=1.0`.
    pub volatility: f64,
    /// Previous day's return, in percent.
    pub lag1_return: f64,
}

impl ManualInput {
    /// Apply the form's widget bounds.
    ///
    /// `close` and `volume` are floored at zero, `volatility` is clamped to
    /// `[0, 1]` and `lag1_return` is left alone.
    pub fn clamped(self) -> Self {
        Self {
            close: floor_at_zero(self.close),
            volume: floor_at_zero(self.volume),
            volatility: if self.volatility.is_nan() {
                0.0
            } else {
                self.volatility.clamp(0.0, 1.0)
            },
            lag1_return: self.lag1_return,
        }
    }

    /// Single-row table with [`MANUAL_COLUMNS`] in order.
    pub fn to_table(&self) -> FeatureTable {
        let input = self.clamped();
        FeatureTable {
            columns: MANUAL_COLUMNS.iter().map(|name| name.to_string()).collect(),
            rows: vec![vec![
                input.close,
                input.volume,
                input.volatility,
                input.lag1_return,
            ]],
        }
    }
}

fn floor_at_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
