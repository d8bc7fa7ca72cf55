#![deny(missing_docs)]
#![deny(warnings)]

//! Entry point for the egui-based trend predictor.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]
use eframe::egui;
use trendcast::app_dirs::AppDirs;
use trendcast::egui_app::controller::FormController;
use trendcast::egui_app::ui::{MIN_VIEWPORT_SIZE, TrendApp, WINDOW_TITLE};
use trendcast::logging;
use trendcast::predict::{Banner, BannerTone};
use trendcast::settings::{AppSettings, ConfigError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dirs = AppDirs::resolve();
    let _log_guard = match &dirs {
        Ok(dirs) => logging::init(dirs)
            .inspect_err(|err| eprintln!("Logging disabled: {err}"))
            .ok(),
        Err(err) => {
            eprintln!("Logging disabled: {err}");
            None
        }
    };

    let loaded = dirs
        .map_err(ConfigError::from)
        .and_then(|dirs| FormController::load_configuration_in(&dirs));
    let controller = match loaded {
        Ok(controller) => controller,
        Err(err) => {
            tracing::warn!("Using default settings: {err}");
            let mut controller = FormController::new(AppSettings::default(), None);
            controller.ui.notice = Some(Banner {
                tone: BannerTone::Warning,
                text: format!("Settings could not be loaded, using defaults: {err}"),
            });
            controller
        }
    };

    let viewport = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size([860.0, 680.0])
        .with_min_inner_size(MIN_VIEWPORT_SIZE)
        .with_drag_and_drop(true);
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |_cc| Ok(Box::new(TrendApp::new(controller)))),
    )?;
    Ok(())
}
