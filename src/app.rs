use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot, popup, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RulinAtlasApp {
    pub state: AppState,
}

impl RulinAtlasApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RulinAtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: threshold ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: tables ----
        if let Some(dataset) = self.state.dataset.clone() {
            let columns = self.state.settings.data.columns.clone();
            egui::TopBottomPanel::bottom("table_panel")
                .resizable(true)
                .default_height(260.0)
                .show(ctx, |ui| {
                    let filtered = |ui: &mut egui::Ui| {
                        ui.strong(format!("出现次数 ≥ {}", self.state.min_count));
                        table::place_table(
                            ui,
                            "filtered_table",
                            &dataset.records,
                            &self.state.visible_rows,
                            &columns,
                        );
                    };

                    if self.state.show_raw_data {
                        let all: Vec<usize> = (0..dataset.len()).collect();
                        ui.columns(2, |cols| {
                            filtered(&mut cols[0]);
                            cols[1].strong("原始数据");
                            table::place_table(&mut cols[1], "raw_table", &dataset.records, &all, &columns);
                        });
                    } else {
                        filtered(ui);
                    }
                });
        }

        // ---- Central panel: clustered map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::map_preview(ui, &mut self.state);
        });

        popup::marker_popup(ctx, &mut self.state);
    }
}
