use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use super::NO_DATA;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

/// Collapsible table of the filtered records, every source column included.
pub fn raw_data(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(view)) = (state.dataset, &state.view) else {
        return;
    };

    egui::CollapsingHeader::new("View Raw Data")
        .id_salt("raw_data")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if view.is_empty() {
                ui.label(NO_DATA);
                return;
            }

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(320.0)
                .columns(Column::auto().at_least(60.0), dataset.headers.len())
                .header(20.0, |mut header| {
                    for name in dataset.headers.iter() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, view.len(), |mut row| {
                        let rec = &dataset.records[view.indices()[row.index()]];
                        for cell in rec.cells.iter() {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell);
                            });
                        }
                    });
                });
        });
}
