//! Feature-importance bar chart.
//!
//! One horizontal bar per input column, first column on top. The y axis
//! shows column names instead of bar positions.

use egui_plot::{Bar, BarChart, GridMark, Plot};

use super::style;
use crate::predict::ImportanceChart;

const ROW_HEIGHT: f32 = 28.0;
const AXIS_HEIGHT: f32 = 48.0;
const BAR_WIDTH: f64 = 0.6;

/// Bars in column order, positioned so the first column is drawn at the top.
pub(crate) fn importance_bars(chart: &ImportanceChart) -> Vec<Bar> {
    let count = chart.bars.len();
    chart
        .bars
        .iter()
        .enumerate()
        .map(|(idx, bar)| {
            Bar::new(bar_position(idx, count), bar.importance)
                .name(&bar.feature)
                .width(BAR_WIDTH)
        })
        .collect()
}

fn bar_position(idx: usize, count: usize) -> f64 {
    (count - 1 - idx) as f64
}

/// Column name for an axis mark, if the mark sits on a bar.
fn feature_at(features: &[String], value: f64) -> Option<&str> {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return None;
    }
    let position = rounded as usize;
    let idx = features.len().checked_sub(1)?.checked_sub(position)?;
    features.get(idx).map(String::as_str)
}

pub(crate) fn render(ui: &mut egui::Ui, chart: &ImportanceChart) {
    let palette = style::palette();
    let features: Vec<String> = chart.bars.iter().map(|bar| bar.feature.clone()).collect();
    let height = chart.bars.len() as f32 * ROW_HEIGHT + AXIS_HEIGHT;

    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new(&chart.title).strong());
    });
    let bars = BarChart::new(chart.title.clone(), importance_bars(chart))
        .horizontal()
        .color(palette.accent_ice);
    Plot::new("feature_importance")
        .height(height)
        .x_axis_label(chart.x_label.clone())
        .y_axis_formatter(move |mark: GridMark, _range| {
            feature_at(&features, mark.value)
                .unwrap_or_default()
                .to_string()
        })
        .include_x(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(bars));
}
