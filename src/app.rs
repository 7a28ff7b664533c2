use eframe::egui;

use crate::config::Settings;
use crate::data::loader;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct WaterAssetsApp {
    pub state: AppState,
}

impl WaterAssetsApp {
    /// Load the dataset named in `settings`; a failed load still opens the
    /// window and shows the error.
    pub fn new(settings: &Settings) -> Self {
        let mut state = AppState::new(settings.granularity);
        match loader::load(&settings.data) {
            Ok(dataset) => {
                if dataset.is_empty() {
                    log::warn!("{} contains no asset records", settings.data.display());
                }
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", settings.data.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
        Self { state }
    }
}

impl eframe::App for WaterAssetsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, raw data ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dashboard.is_none() {
                plot::placeholder(ui, &self.state);
                return;
            }
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("Water Assets Management Dashboard");
                    ui.add_space(4.0);
                    panels::kpi_row(ui, &self.state);
                    plot::dashboard(ui, &self.state);
                    ui.add_space(8.0);
                    table::raw_data(ui, &self.state);
                });
        });
    }
}
