mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::WaterAssetsApp;
use clap::Parser;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::parse();
    log::info!("Starting with {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Water Assets Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(WaterAssetsApp::new(&settings)))),
    )
}
