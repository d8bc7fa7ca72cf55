//! egui front end for the trend predictor.
pub mod controller;
pub mod state;
pub mod ui;
