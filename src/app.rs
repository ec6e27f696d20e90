use eframe::egui;

use crate::state::{AppState, View};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CanopyApp {
    pub state: AppState,
}

impl CanopyApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CanopyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: column choice + multi-select ----
        egui::SidePanel::left("selection_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        if self.state.view == View::Area && self.state.collection.is_some() {
            // ---- Right side panel: ranked legend ----
            egui::SidePanel::right("stats_panel")
                .default_width(200.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::stats_panel(ui, &self.state);
                });

            // ---- Bottom panel: grouped summary ----
            egui::TopBottomPanel::bottom("summary_panel")
                .default_height(180.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::summary_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::central_plot(ui, &self.state);
        });
    }
}
