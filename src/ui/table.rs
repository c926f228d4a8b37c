use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{ColumnMap, PlaceRecord};

// ---------------------------------------------------------------------------
// Place table
// ---------------------------------------------------------------------------

/// Render `rows` of `records` under the source column labels.
pub fn place_table(ui: &mut Ui, id: &str, records: &[PlaceRecord], rows: &[usize], columns: &ColumnMap) {
    let labels = columns.labels();
    let max_height = ui.available_height().max(120.0);

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(60.0))
            .column(Column::auto().at_least(60.0))
            .column(Column::initial(160.0).at_least(80.0).clip(true))
            .column(Column::initial(240.0).at_least(80.0).clip(true))
            .column(Column::auto().at_least(60.0))
            .column(Column::remainder().at_least(60.0))
            .min_scrolled_height(0.0)
            .max_scroll_height(max_height)
            .header(20.0, |mut header| {
                for label in labels {
                    header.col(|ui| {
                        ui.strong(label);
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, rows.len(), |mut row| {
                    let Some(record) = rows.get(row.index()).and_then(|&i| records.get(i)) else {
                        return;
                    };
                    row.col(|ui| {
                        ui.label(&record.city);
                    });
                    row.col(|ui| {
                        ui.label(record.occurrence_count.to_string());
                    });
                    row.col(|ui| {
                        ui.label(&record.related_figures)
                            .on_hover_text(&record.related_figures);
                    });
                    row.col(|ui| {
                        ui.label(&record.context_summary)
                            .on_hover_text(&record.context_summary);
                    });
                    row.col(|ui| {
                        coordinate_cell(ui, record.latitude);
                    });
                    row.col(|ui| {
                        coordinate_cell(ui, record.longitude);
                    });
                });
            });
    });
}

fn coordinate_cell(ui: &mut Ui, value: f64) {
    if value.is_finite() {
        ui.label(format!("{value:.4}"));
    } else {
        ui.label(RichText::new("-").color(Color32::DARK_GRAY));
    }
}
