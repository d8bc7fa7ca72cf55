//! Throwaway app folder plus the files a prediction session touches.

use std::path::PathBuf;

use serde_json::{Value, json};
use tempfile::TempDir;
use trendcast::app_dirs::AppDirs;
use trendcast::egui_app::controller::FormController;

pub struct Workspace {
    temp: TempDir,
    pub dirs: AppDirs,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let dirs = AppDirs::under(temp.path().join("config"));
        Self { temp, dirs }
    }

    /// Start a controller the way the binary does, against this folder.
    pub fn controller(&self) -> FormController {
        FormController::load_configuration_in(&self.dirs).expect("load settings")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn write_model(&self, format_version: u32) -> PathBuf {
        let bytes = serde_json::to_vec_pretty(&forest_artifact(format_version))
            .expect("serialize artifact");
        self.write("rf_model.json", &bytes)
    }
}

/// Two-tree forest over the manual columns: positive lag return leans
/// Bullish, negative leans Bearish unless volatility is low.
pub fn forest_artifact(format_version: u32) -> Value {
    json!({
        "format": "trendcast-forest",
        "format_version": format_version,
        "classes": ["Bearish", "Bullish", "Stable"],
        "n_features": 4,
        "feature_names": ["close", "volume", "volatility", "lag1_return"],
        "feature_importances": [0.4, 0.3, 0.2, 0.1],
        "trees": [
            { "nodes": [
                { "kind": "split", "feature": 3, "threshold": 0.0, "left": 1, "right": 2 },
                { "kind": "split", "feature": 2, "threshold": 0.1, "left": 3, "right": 4 },
                { "kind": "leaf", "distribution": [0.0, 10.0, 0.0] },
                { "kind": "leaf", "distribution": [0.0, 0.0, 5.0] },
                { "kind": "leaf", "distribution": [8.0, 0.0, 2.0] }
            ]},
            { "nodes": [
                { "kind": "split", "feature": 3, "threshold": 0.0, "left": 1, "right": 2 },
                { "kind": "leaf", "distribution": [0.6, 0.0, 0.4] },
                { "kind": "leaf", "distribution": [0.1, 0.9, 0.0] }
            ]}
        ]
    })
}
