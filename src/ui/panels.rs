use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::map::render::RenderError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – threshold and data-quality widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("筛选");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    let total = dataset.len();

    ui.strong("最少出现次数");
    let mut min_count = state.min_count;
    let slider = egui::Slider::new(&mut min_count, 1..=state.max_count()).clamping(egui::SliderClamping::Always);
    if ui.add(slider).changed() {
        state.set_min_count(min_count);
    }
    ui.label(format!("{} / {} rows shown", state.visible_rows.len(), total));
    ui.separator();

    ui.checkbox(&mut state.show_raw_data, "显示原始数据");
    if ui.button("Reset map view").clicked() {
        state.reset_view = true;
    }
    ui.separator();

    let skipped = &state.markers.skipped;
    if skipped.is_empty() {
        ui.label(format!("{} places on the map", state.markers.len()));
        return;
    }

    egui::CollapsingHeader::new(
        RichText::new(format!("{} rows not on the map", skipped.len())).color(Color32::from_rgb(200, 120, 0)),
    )
    .default_open(false)
    .show(ui, |ui: &mut Ui| {
        ScrollArea::vertical()
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui: &mut Ui| {
                for warning in skipped {
                    ui.label(RichText::new(warning.to_string()).small());
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            let can_export = state.dataset.is_some();
            if ui.add_enabled(can_export, egui::Button::new("Export map…")).clicked() {
                export_map_dialog(ui.ctx(), state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} places, {} on map, {} in table",
                ds.path.display(),
                ds.len(),
                state.markers.len(),
                state.visible_rows.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open place table")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
        if let Some(ds) = &state.dataset {
            log::info!("Loaded {} places from {}", ds.len(), path.display());
        }
    }
}

/// Ask for a destination, write the map page and open it in the browser.
pub fn export_map_dialog(ctx: &egui::Context, state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export map page")
        .set_file_name("rulin_atlas_map.html")
        .add_filter("HTML", &["html"])
        .save_file()
    else {
        return;
    };

    match state.export_map(&path) {
        Ok(()) => {
            log::info!("Map written to {}", path.display());
            let target = path.canonicalize().unwrap_or(path);
            ctx.open_url(egui::OpenUrl::new_tab(format!("file://{}", target.display())));
        }
        Err(e) => report_render_error(state, &e),
    }
}

fn report_render_error(state: &mut AppState, error: &RenderError) {
    log::warn!("Map export failed: {error}");
    state.status_message = Some(format!("Map export failed: {error}"));
}
