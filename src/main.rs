mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::CanopyApp;
use eframe::egui;
use rusty_canopy::CanopyConfig;
use state::AppState;

/// Read from the working directory when present.
const CONFIG_FILE: &str = "canopy.json";

fn main() -> eframe::Result {
    env_logger::init();

    let config = CanopyConfig::load_or_default(Path::new(CONFIG_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Canopy – Yearly Feature Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(CanopyApp::new(AppState::new(config))))),
    )
}
