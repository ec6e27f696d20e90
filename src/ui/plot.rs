use eframe::egui::{self, Color32, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Polygon};

use rusty_canopy::data::format::format_thousands;

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Central panel: whichever chart is active
// ---------------------------------------------------------------------------

pub fn central_plot(ui: &mut Ui, state: &AppState) {
    match state.view {
        View::Area => area_plot(ui, state),
        View::Line => line_plot(ui, state),
    }
}

fn placeholder(ui: &mut Ui, text: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(text);
    });
}

/// Stacked area chart: one filled band per selected feature value.
fn area_plot(ui: &mut Ui, state: &AppState) {
    let Some(area) = &state.area else {
        placeholder(ui, "Open yearly files to plot  (File → Open yearly files…)");
        return;
    };
    let chart = area.chart.borrow();

    ui.heading(&chart.title);
    Plot::new("area_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label(chart.y_label.clone())
        .y_axis_formatter(|mark, _range| format_thousands(mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let color = area.colors.color_for(&series.name);
                let top = series.top();

                // Upper edge left to right, then the band below right to left.
                let outline: PlotPoints = chart
                    .years
                    .iter()
                    .zip(&top)
                    .map(|(y, v)| [*y as f64, *v])
                    .chain(
                        chart
                            .years
                            .iter()
                            .zip(&series.baseline)
                            .rev()
                            .map(|(y, b)| [*y as f64, *b]),
                    )
                    .collect();

                plot_ui.polygon(
                    Polygon::new(outline)
                        .name(&series.name)
                        .fill_color(color.gamma_multiply(0.5))
                        .stroke(Stroke::new(1.0, color)),
                );
            }
        });
}

/// One line per selected category, attribution underneath.
fn line_plot(ui: &mut Ui, state: &AppState) {
    let Some(line) = &state.line else {
        placeholder(ui, "Open a wide CSV to plot  (File → Open wide CSV…)");
        return;
    };
    let chart = line.chart.borrow();

    ui.heading(&chart.title);
    let plot_height = (ui.available_height() - 28.0).max(100.0);
    Plot::new("line_plot")
        .legend(Legend::default())
        .height(plot_height)
        .x_axis_label(chart.x_label.clone())
        .y_axis_label(chart.y_label.clone())
        .y_axis_formatter(|mark, _range| format_thousands(mark.value))
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let points: PlotPoints = series.points.iter().copied().collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&series.name)
                        .color(line.colors.color_for(&series.name))
                        .width(1.5),
                );
            }
        });

    if !chart.attribution.is_empty() {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            ui.label(egui::RichText::new(&chart.attribution).small().color(Color32::GRAY));
        });
    }
}
