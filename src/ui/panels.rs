use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::DEFAULT_EXPORT_NAME;
use crate::data::filter::DateRange;
use crate::data::model::{Category, Dataset, IndexField};
use crate::data::summary::Granularity;
use crate::state::AppState;

/// Label of the "no constraint" choice in every control.
const ALL: &str = "All";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- State, then the districts of that state ----
            ui.strong("State");
            let mut selected_state = state.criteria.state.clone();
            single_select(ui, "state_select", &mut selected_state, dataset.distinct(Category::State));
            if selected_state != state.criteria.state {
                state.set_state(selected_state);
            }

            ui.strong("District");
            let districts = state.district_options();
            let mut selected_district = state.criteria.district.clone();
            ui.add_enabled_ui(state.criteria.state.is_some(), |ui: &mut Ui| {
                single_select(
                    ui,
                    "district_select",
                    &mut selected_district,
                    districts.iter().map(String::as_str),
                );
            });
            if selected_district != state.criteria.district {
                state.set_district(selected_district);
            }
            ui.separator();

            // ---- Multi-valued filters (collapsible) ----
            multi_select(ui, state, dataset, Category::AssetType);
            multi_select(ui, state, dataset, Category::Status);
            ui.separator();

            date_range(ui, state, dataset);
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

fn single_select<'a>(
    ui: &mut Ui,
    id: &str,
    selected: &mut Option<String>,
    values: impl Iterator<Item = &'a str>,
) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.as_deref().unwrap_or(ALL))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(selected, None, ALL);
            for value in values {
                ui.selectable_value(selected, Some(value.to_string()), value);
            }
        });
}

/// Checkbox list where "All" means an empty selection.
fn multi_select(ui: &mut Ui, state: &mut AppState, dataset: &Dataset, category: Category) {
    let selected = match category {
        Category::AssetType => state.criteria.asset_types.clone(),
        Category::Status => state.criteria.statuses.clone(),
        Category::State | Category::District => return,
    };

    let n_total = dataset.distinct(category).count();
    let header_text = if selected.is_empty() {
        format!("{category}  (all {n_total})")
    } else {
        format!("{category}  ({}/{n_total})", selected.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(category.column())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            let mut all = selected.is_empty();
            if ui.checkbox(&mut all, ALL).changed() && all {
                state.select_all(category);
            }

            for value in dataset.distinct(category) {
                let mut text = RichText::new(value);
                if category == Category::AssetType {
                    text = text.color(state.asset_type_colors.color_for(value));
                }
                let mut checked = selected.contains(value);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle(category, value);
                }
            }
        });
}

fn date_range(ui: &mut Ui, state: &mut AppState, dataset: &Dataset) {
    ui.strong("Survey date");
    let Some((min, max)) = dataset.date_bounds() else {
        ui.label("No survey dates.");
        return;
    };

    // An incomplete range does not filter; show the data bounds instead.
    let current = state.criteria.date_range;
    let shown = (current.start.unwrap_or(min), current.end.unwrap_or(max));
    let (mut start, mut end) = shown;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        ui.add(DatePickerButton::new(&mut start).id_salt("date_from"));
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        ui.add(DatePickerButton::new(&mut end).id_salt("date_to"));
    });

    // Pickers are not bounded; keep the selection inside the data.
    let (start, end) = (start.clamp(min, max), end.clamp(min, max));
    if (start, end) != shown {
        state.set_date_range(DateRange::new(start, end));
    }
    if start > end {
        ui.colored_label(Color32::RED, "Start date is after end date.");
    }
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// Render the row of headline numbers.
pub fn kpi_row(ui: &mut Ui, state: &AppState) {
    let Some(dashboard) = &state.dashboard else {
        return;
    };
    let kpis = &dashboard.kpis;

    ui.strong("Key Performance Indicators");
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Total Assets", kpis.total_assets.to_string());
        metric(&mut cols[1], "Total Area (ha)", format_area(kpis.total_area_ha));
        for (col, field, value) in [
            (2, IndexField::Ndvi, kpis.mean_ndvi),
            (3, IndexField::Ndwi, kpis.mean_ndwi),
        ] {
            metric(&mut cols[col], &format!("Average {}", field.label()), format_index(value));
        }
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(label).weak());
        ui.heading(value);
    });
}

/// Two decimals with thousands separators, e.g. `12,345.60`.
pub fn format_area(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

/// Three decimals, or "n/a" when the mean is undefined.
pub fn format_index(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "n/a".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui
                .add_enabled(state.view.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Timeline", |ui: &mut Ui| {
            for granularity in Granularity::ALL {
                if ui
                    .selectable_label(state.granularity == granularity, granularity.label())
                    .clicked()
                {
                    state.set_granularity(granularity);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        if let Some(ds) = state.dataset {
            let filtered = if state.criteria.is_unconstrained() {
                ""
            } else {
                " (filtered)"
            };
            ui.label(format!(
                "{} assets loaded, {} visible{filtered}",
                ds.len(),
                state.visible_count()
            ));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered assets")
        .set_file_name(DEFAULT_EXPORT_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match state.export_to(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
