use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, Interactive, View};

// ---------------------------------------------------------------------------
// Left side panel – column choice and multi-select
// ---------------------------------------------------------------------------

/// Render the left selection panel for the active view.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    match state.view {
        View::Area => area_controls(ui, state),
        View::Line => line_controls(ui, state),
    }
}

fn area_controls(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Features");
    ui.separator();

    if state.collection.is_none() {
        ui.label("No yearly files loaded.");
        return;
    }

    let columns = state.columns.clone();

    ui.strong("Feature column");
    let current = state.feature_column.clone();
    egui::ComboBox::from_id_salt("feature_column")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &columns {
                if ui.selectable_label(current == *col, col).clicked() && current != *col {
                    state.set_feature_column(col.clone());
                }
            }
        });

    ui.strong("Value column");
    let current = state.value_column.clone();
    egui::ComboBox::from_id_salt("value_column")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &columns {
                if ui.selectable_label(current == *col, col).clicked() && current != *col {
                    state.set_value_column(col.clone());
                }
            }
        });
    ui.separator();

    if let Some(area) = &mut state.area {
        selection_list(ui, area);
    }
}

fn line_controls(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Categories");
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Feature type");
        ui.text_edit_singleline(&mut state.feature_type);
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Attribution");
        ui.text_edit_singleline(&mut state.attribution);
    });
    ui.small("Both apply to the next wide table opened.");
    ui.separator();

    match &mut state.line {
        Some(line) => selection_list(ui, line),
        None => {
            ui.label("No wide table loaded.");
        }
    }
}

/// Checkbox per option with All / None shortcuts. Every change goes through
/// the [`MultiSelect`](rusty_canopy::chart::MultiSelect), which rebuilds the
/// chart.
fn selection_list<T>(ui: &mut Ui, interactive: &mut Interactive<T>) {
    let options = interactive.select.options().to_vec();
    let n_selected = options
        .iter()
        .filter(|o| interactive.select.is_selected(o))
        .count();
    ui.label(format!("{n_selected}/{} selected", options.len()));

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            interactive.select.select_all();
        }
        if ui.small_button("None").clicked() {
            interactive.select.select_none();
        }
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for option in &options {
                let mut checked = interactive.select.is_selected(option);
                let text = RichText::new(option).color(interactive.colors.color_for(option));
                if ui.checkbox(&mut checked, text).changed() {
                    interactive.select.set(option, checked);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Right side panel – ranked legend
// ---------------------------------------------------------------------------

pub fn stats_panel(ui: &mut Ui, state: &AppState) {
    if let Some(area) = &state.area {
        ui.monospace(area.chart.borrow().legend_text());
    }
}

// ---------------------------------------------------------------------------
// Bottom panel – grouped summary of one year
// ---------------------------------------------------------------------------

pub fn summary_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(collection) = state.collection.clone() else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Summary for");
        let current = state.summary_year;
        egui::ComboBox::from_id_salt("summary_year")
            .selected_text(current.map(|y| y.to_string()).unwrap_or_default())
            .show_ui(ui, |ui: &mut Ui| {
                for year in collection.keys() {
                    if ui
                        .selectable_label(current == Some(*year), year.to_string())
                        .clicked()
                    {
                        state.set_summary_year(*year);
                    }
                }
            });
        if let Some(summary) = &state.summary {
            ui.label(format!("Total: {}", summary.formatted_total()));
        }
    });

    let Some(summary) = &state.summary else {
        return;
    };
    let rows = summary.formatted_groups();

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(160.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong(&state.feature_column);
            });
            header.col(|ui| {
                ui.strong(&state.value_column);
            });
        })
        .body(|mut body| {
            for (group, sum) in &rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(group);
                    });
                    row.col(|ui| {
                        ui.monospace(sum);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open yearly files…").clicked() {
                open_yearly_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open wide CSV…").clicked() {
                open_wide_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(state.collection.is_some(), egui::Button::new("Export pivot CSV…"))
                .clicked()
            {
                export_pivot_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.collection.is_some(), egui::Button::new("Pivot as line chart"))
                .clicked()
            {
                state.pivot_to_line_chart();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.summary_year.is_some(), egui::Button::new("Describe summary year"))
                .clicked()
            {
                state.describe_summary_year();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Convert to GeoJSON…").clicked() {
                if let Some(path) = vector_file_dialog("Convert to GeoJSON") {
                    state.convert_file(&path);
                }
                ui.close_menu();
            }
            if ui.button("Split into GeoJSON chunks…").clicked() {
                if let Some(path) = vector_file_dialog("Split into GeoJSON chunks") {
                    state.split_file(&path);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.selectable_label(state.view == View::Area, "Area over time").clicked() {
            state.view = View::Area;
        }
        if ui.selectable_label(state.view == View::Line, "Categories").clicked() {
            state.view = View::Line;
        }

        ui.separator();

        if let Some(collection) = &state.collection {
            let rows: usize = collection.values().map(|t| t.len()).sum();
            ui.label(format!("{} years, {rows} features", collection.len()));
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

const VECTOR_EXTENSIONS: [&str; 6] = ["geojson", "json", "csv", "parquet", "pq", "shp"];

fn vector_file_dialog(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Vector files", &VECTOR_EXTENSIONS)
        .pick_file()
}

fn open_yearly_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open one file per year")
        .add_filter("Vector files", &VECTOR_EXTENSIONS)
        .add_filter("GeoJSON", &["geojson", "json"])
        .add_filter("Shapefile", &["shp"])
        .pick_files();

    if let Some(paths) = files {
        state.open_yearly_files(&paths);
    }
}

fn open_wide_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open wide time-series table")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_wide_csv(&path);
    }
}

fn export_pivot_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export pivot")
        .add_filter("CSV", &["csv"])
        .set_file_name("pivot.csv")
        .save_file();

    if let Some(path) = file {
        state.export_pivot(&path);
    }
}
