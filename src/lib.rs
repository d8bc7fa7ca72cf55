//! Library exports for the trend predictor and its tests.
/// Application directory resolution.
pub mod app_dirs;
/// Shared egui UI modules.
pub mod egui_app;
/// Feature tables from manual input or CSV uploads.
pub mod features;
/// Tracing setup.
pub mod logging;
/// Trend classifiers and artifact loading.
pub mod model;
/// Per-click prediction handler.
pub mod predict;
/// Persisted user settings.
pub mod settings;
