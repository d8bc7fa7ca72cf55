//! egui renderer for the trend predictor window.

mod chart;
pub mod style;

use eframe::egui::{self, Frame, Margin, RichText, Ui};

use crate::egui_app::controller::FormController;
use crate::features::{InputMode, ManualInput};
use crate::predict::{Banner, RenderInstructions};

/// Window title used by the native viewport.
pub const WINDOW_TITLE: &str = "Stock Trend Predictor";
/// Smallest window that still fits the sidebar and the chart.
pub const MIN_VIEWPORT_SIZE: egui::Vec2 = egui::vec2(640.0, 480.0);

const HEADING: &str = "Next-Day Stock Trend Predictor";
const DESCRIPTION: &str = "Predict whether tomorrow's trend will be Bullish, Bearish, or Stable \
                           using a model trained on S&P 500 data.";
const PREDICT_LABEL: &str = "Predict Next-Day Trend";

/// Renders the form using the controller state.
pub struct TrendApp {
    controller: FormController,
    visuals_set: bool,
}

impl TrendApp {
    pub fn new(controller: FormController) -> Self {
        Self {
            controller,
            visuals_set: false,
        }
    }

    fn apply_visuals(&mut self, ctx: &egui::Context) {
        if self.visuals_set {
            return;
        }
        let mut visuals = egui::Visuals::dark();
        style::apply_visuals(&mut visuals);
        ctx.set_visuals(visuals);
        self.visuals_set = true;
    }

    /// Treat a CSV dropped onto the window as an upload.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        let Some(file) = dropped else {
            return;
        };
        self.controller.set_mode(InputMode::Upload);
        if let Some(path) = &file.path {
            self.controller.upload_from_path(path);
        } else if let Some(bytes) = &file.bytes {
            self.controller.upload_bytes(file.name.clone(), bytes);
        }
    }

    fn render_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("input_panel")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.heading("Input Data");
                ui.add_space(4.0);
                ui.label("Choose input method:");
                let mut mode = self.controller.ui.mode;
                for option in [InputMode::Manual, InputMode::Upload] {
                    ui.radio_value(&mut mode, option, option.label());
                }
                self.controller.set_mode(mode);

                ui.add_space(12.0);
                ui.separator();
                ui.label(RichText::new("Model").small().color(style::palette().text_muted));
                let model_path = self.controller.ui.model_path.display().to_string();
                ui.label(RichText::new(&model_path).monospace())
                    .on_hover_text("Loaded fresh on every prediction");
                if ui.button("Choose model…").clicked() {
                    self.controller.choose_model_via_dialog();
                }
            });
    }

    fn render_manual_inputs(&mut self, ui: &mut Ui) {
        let mut manual: ManualInput = self.controller.ui.manual;
        egui::Grid::new("manual_inputs")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Today's closing price:");
                ui.add(
                    egui::DragValue::new(&mut manual.close)
                        .range(0.0..=f64::MAX)
                        .speed(0.1)
                        .fixed_decimals(2),
                );
                ui.end_row();

                ui.label("Today's volume:");
                ui.add(
                    egui::DragValue::new(&mut manual.volume)
                        .range(0.0..=f64::MAX)
                        .speed(100.0),
                );
                ui.end_row();

                ui.label("Volatility (0–1):");
                ui.add(egui::Slider::new(&mut manual.volatility, 0.0..=1.0).step_by(0.01));
                ui.end_row();

                ui.label("Lag 1 Return (%):");
                ui.add(egui::DragValue::new(&mut manual.lag1_return).speed(0.01));
                ui.end_row();
            });
        if manual != self.controller.ui.manual {
            self.controller.set_manual(manual);
        }
    }

    fn render_upload(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui.button("Upload your CSV file…").clicked() {
                self.controller.upload_via_dialog();
            }
            if self.controller.ui.upload.file_name.is_some() && ui.button("Clear").clicked() {
                self.controller.clear_upload();
            }
        });
        match self.controller.ui.upload.summary() {
            Some(summary) => {
                ui.label(RichText::new(summary).color(style::palette().text_muted));
            }
            None => {
                ui.label(RichText::new("No file selected").color(style::palette().text_muted));
            }
        }
    }

    fn render_result(ui: &mut Ui, result: &RenderInstructions) {
        render_banner(ui, &result.banner);
        if let Some(trace) = &result.trace {
            egui::CollapsingHeader::new("Details")
                .id_salt("prediction_trace")
                .show(ui, |ui| {
                    ui.add(egui::Label::new(RichText::new(trace).monospace()).wrap());
                });
        }
        if let Some(importances) = &result.chart {
            ui.add_space(12.0);
            ui.heading("Feature Importances");
            ui.add_space(4.0);
            chart::render(ui, importances);
        }
    }

    fn render_main(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(8.0);
                ui.heading(HEADING);
                ui.label(RichText::new(DESCRIPTION).color(style::palette().text_muted));
                ui.add_space(12.0);

                match self.controller.ui.mode {
                    InputMode::Manual => self.render_manual_inputs(ui),
                    InputMode::Upload => self.render_upload(ui),
                }
                if let Some(notice) = &self.controller.ui.notice {
                    ui.add_space(6.0);
                    render_banner(ui, notice);
                }

                ui.add_space(12.0);
                if ui.button(RichText::new(PREDICT_LABEL).strong()).clicked() {
                    self.controller.predict();
                }
                ui.add_space(8.0);

                if let Some(result) = &self.controller.ui.result {
                    Self::render_result(ui, result);
                }
            });
        });
    }
}

fn render_banner(ui: &mut Ui, banner: &Banner) {
    Frame::new()
        .fill(style::banner_fill(banner.tone))
        .stroke(egui::Stroke::new(1.0, style::banner_color(banner.tone)))
        .inner_margin(Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(&banner.text).color(style::banner_color(banner.tone)));
        });
}

impl eframe::App for TrendApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_visuals(ctx);
        self.handle_dropped_files(ctx);
        self.render_sidebar(ctx);
        self.render_main(ctx);
    }
}
