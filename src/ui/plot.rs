use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, Points};

use super::NO_DATA;
use crate::color::{heat_color, ColorMap};
use crate::data::model::Dataset;
use crate::data::summary::{CrossTab, Granularity, ScatterSeries};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;
const STATE_BAR_COLOR: Color32 = Color32::from_rgb(70, 130, 180);

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Shown instead of the dashboard when nothing is loaded.
pub fn placeholder(ui: &mut Ui, state: &AppState) {
    ui.centered_and_justified(|ui: &mut Ui| {
        match &state.status_message {
            Some(msg) => ui.heading(RichText::new(msg).color(Color32::RED)),
            None => ui.heading("No dataset loaded."),
        };
    });
}

/// Render every chart of the dashboard.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(dash) = &state.dashboard else {
        return;
    };

    ui.add_space(8.0);
    ui.strong("Asset Distribution");
    ui.columns(2, |cols| {
        let types = |v: &str| state.asset_type_colors.color_for(v);
        let statuses = |v: &str| state.status_colors.color_for(v);
        category_bars(
            &mut cols[0],
            "asset_type_chart",
            "Asset Type Distribution",
            &dash.asset_types,
            &types,
            false,
        );
        category_bars(
            &mut cols[1],
            "status_chart",
            "Asset Status Distribution",
            &dash.statuses,
            &statuses,
            false,
        );
    });

    ui.add_space(8.0);
    ui.strong("Temporal Analysis");
    ui.columns(2, |cols| {
        timeline(&mut cols[0], &dash.timeline, state.granularity);
        if let Some(dataset) = state.dataset {
            scatter(&mut cols[1], dataset, &dash.scatter, &state.asset_type_colors);
        }
    });

    ui.add_space(8.0);
    ui.strong("Geographic Analysis");
    ui.columns(2, |cols| {
        category_bars(
            &mut cols[0],
            "top_states_chart",
            "Top 10 States by Asset Count",
            &dash.top_states,
            &|_| STATE_BAR_COLOR,
            true,
        );
        heatmap(&mut cols[1], &dash.heatmap);
    });
}

// ---------------------------------------------------------------------------
// Bar charts over categories
// ---------------------------------------------------------------------------

/// Bars in the order of `counts`. Horizontal charts put the first group on
/// top.
fn category_bars(
    ui: &mut Ui,
    id: &str,
    title: &str,
    counts: &[(String, usize)],
    color_of: &dyn Fn(&str) -> Color32,
    horizontal: bool,
) {
    ui.label(RichText::new(title).strong());
    if counts.is_empty() {
        ui.label(NO_DATA);
        return;
    }

    let n = counts.len();
    let position = |i: usize| if horizontal { n - 1 - i } else { i };

    let mut labels = vec![String::new(); n];
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (value, count))| {
            labels[position(i)] = value.clone();
            Bar::new(position(i) as f64, *count as f64)
                .name(value)
                .fill(color_of(value))
        })
        .collect();

    let axis = move |mark: GridMark, _range: &RangeInclusive<f64>| category_label(&labels, mark.value);

    let mut chart = BarChart::new(bars).width(0.7).name(title);
    let mut plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);
    if horizontal {
        chart = chart.horizontal();
        plot = plot.y_axis_formatter(axis).x_axis_label("Count");
    } else {
        plot = plot.x_axis_formatter(axis).y_axis_label("Count");
    }

    plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Label for a grid mark sitting on a bar position, empty elsewhere.
fn category_label(labels: &[String], value: f64) -> String {
    let pos = value.round();
    if (value - pos).abs() > 1e-6 || pos < 0.0 {
        return String::new();
    }
    labels.get(pos as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

fn timeline(ui: &mut Ui, buckets: &[(NaiveDate, usize)], granularity: Granularity) {
    ui.label(RichText::new(format!("Assets Surveyed Over Time ({granularity})")).strong());
    if buckets.is_empty() {
        ui.label(NO_DATA);
        return;
    }

    let points: Vec<[f64; 2]> = buckets
        .iter()
        .map(|(start, n)| [day_number(*start), *n as f64])
        .collect();

    Plot::new("timeline_chart")
        .height(CHART_HEIGHT)
        .x_axis_label("Survey date")
        .y_axis_label("Number of assets")
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .label_formatter(|_name, point| format!("{}\n{:.0} assets", date_label(point.x), point.y))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points.clone()).name("Assets").width(2.0));
            plot_ui.points(Points::new(points.clone()).radius(3.0));
        });
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// NDVI vs NDWI scatter
// ---------------------------------------------------------------------------

fn scatter(ui: &mut Ui, dataset: &Dataset, series: &[ScatterSeries], colors: &ColorMap) {
    ui.label(RichText::new("NDVI vs NDWI by Asset Type").strong());
    if series.is_empty() {
        ui.label(NO_DATA);
        return;
    }

    Plot::new("ndvi_ndwi_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("NDVI")
        .y_axis_label("NDWI")
        .label_formatter(|name, point| scatter_hover(dataset, series, name, point.x, point.y))
        .show(ui, |plot_ui| {
            for s in series {
                plot_ui.points(
                    Points::new(s.points.clone())
                        .name(&s.label)
                        .color(colors.color_for(&s.label))
                        .radius(3.0),
                );
            }
        });
}

/// Hover text naming the asset under the cursor, plain coordinates when the
/// cursor is not on a series.
fn scatter_hover(
    dataset: &Dataset,
    series: &[ScatterSeries],
    name: &str,
    ndvi: f64,
    ndwi: f64,
) -> String {
    let coords = format!("NDVI {ndvi:.3}, NDWI {ndwi:.3}");
    series
        .iter()
        .find(|s| s.label == name)
        .and_then(|s| s.nearest(ndvi, ndwi))
        .and_then(|idx| dataset.records.get(idx))
        .map_or(coords.clone(), |rec| {
            format!(
                "{}\n{} / {}\n{}\n{coords}",
                rec.asset_name, rec.state, rec.district, rec.asset_type
            )
        })
}

// ---------------------------------------------------------------------------
// State × asset type heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, table: &CrossTab) {
    ui.label(RichText::new("Asset Type Distribution by State").strong());
    if table.is_empty() {
        let warn = ui.visuals().warn_fg_color;
        ui.colored_label(warn, NO_DATA);
        return;
    }

    let max = table.max_count().max(1) as f32;
    let total = table.total().max(1) as f64;
    ScrollArea::both()
        .id_salt("heatmap_scroll")
        .max_height(CHART_HEIGHT)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("heatmap_grid")
                .spacing([2.0, 2.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label(RichText::new(format!("{} \\ {}", table.row_field, table.col_field)).weak());
                    for col in &table.columns {
                        ui.label(RichText::new(col).strong());
                    }
                    ui.end_row();

                    for row in &table.rows {
                        ui.label(RichText::new(row).strong());
                        for col in &table.columns {
                            let n = table.get(row, col);
                            let share = 100.0 * n as f64 / total;
                            heat_cell(ui, n, n as f32 / max)
                                .on_hover_text(format!("{row} / {col}: {n} ({share:.1}% of assets)"));
                        }
                        ui.end_row();
                    }
                });
        });
}

fn heat_cell(ui: &mut Ui, count: usize, intensity: f32) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(56.0, 22.0), Sense::hover());
    ui.painter().rect_filled(rect, 2.0, heat_color(intensity));
    let text_color = if intensity > 0.55 {
        Color32::WHITE
    } else {
        Color32::BLACK
    };
    ui.painter().text(
        rect.center(),
        Align2::CENTER_CENTER,
        count.to_string(),
        FontId::proportional(12.0),
        text_color,
    );
    response
}
