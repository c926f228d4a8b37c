use eframe::egui::{self, RichText, Ui};

use crate::color::{to_color32, POPUP_HEADING};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Marker popup window
// ---------------------------------------------------------------------------

/// Show the details of the selected marker. egui labels are plain text, so
/// the raw record fields are shown rather than the escaped markup.
pub fn marker_popup(ctx: &egui::Context, state: &mut AppState) {
    let Some(marker) = state.selected() else {
        return;
    };
    let Some(record) = state
        .dataset
        .as_ref()
        .and_then(|ds| ds.records.get(marker.row))
    else {
        return;
    };

    let mut open = true;
    egui::Window::new(RichText::new(&record.city).color(to_color32(POPUP_HEADING)))
        .id(egui::Id::new("marker_popup"))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(280.0)
        .show(ctx, |ui: &mut Ui| {
            ui.set_max_width(280.0);
            labelled_line(ui, "出现次数：", &format!("{}次", record.occurrence_count));
            labelled_line(ui, "相关人物：", &record.related_figures);
            labelled_line(ui, "关键事件：", &record.context_summary);
        });

    if !open {
        state.selected_marker = None;
    }
}

fn labelled_line(ui: &mut Ui, label: &str, text: &str) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.strong(label);
        ui.label(text);
    });
}
