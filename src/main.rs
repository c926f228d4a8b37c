mod app;
mod color;
mod config;
mod data;
mod export;
mod map;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::anyhow;
use app::RulinAtlasApp;
use clap::{Parser, Subcommand};
use eframe::egui;

use crate::config::Settings;
use crate::export::ExportOptions;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "rulin-atlas", version, about = "Place-name atlas for The Scholars (儒林外史)")]
struct Cli {
    /// Settings file (TOML). Missing file means defaults.
    #[arg(long, default_value = "rulin-atlas.toml")]
    config: PathBuf,

    /// Place table to open, overriding `data.path` from the settings.
    #[arg(long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the map page (and optionally the filtered table) without a window.
    Export {
        /// Output HTML file.
        #[arg(long, default_value = "rulin_atlas_map.html")]
        out: PathBuf,

        /// Also write rows with count >= --min-count to this CSV file.
        #[arg(long)]
        table: Option<PathBuf>,

        /// Table threshold.
        #[arg(long, default_value_t = 1)]
        min_count: i64,

        /// Check that the tile server answers before writing the map.
        #[arg(long)]
        probe_tiles: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::load_from_file(&cli.config)?;
    if let Some(path) = cli.data {
        settings.data.path = path;
    }

    match cli.command {
        Some(Command::Export {
            out,
            table,
            min_count,
            probe_tiles,
        }) => {
            let options = ExportOptions {
                out,
                table,
                min_count,
                probe_tiles,
            };
            let summary = export::run(&settings, &options)?;
            println!(
                "{} records, {} markers, {} skipped",
                summary.records, summary.markers, summary.skipped
            );
            if summary.map_written {
                println!("Map written to {}", options.out.display());
            } else {
                println!("Map not written (see log)");
            }
            if let Some(rows) = summary.table_rows {
                println!("{rows} table rows written");
            }
            Ok(())
        }
        None => run_viewer(settings),
    }
}

fn run_viewer(settings: Settings) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rulin Atlas – 儒林外史地名地图",
        options,
        Box::new(|cc| {
            ui::fonts::install_cjk_fonts(&cc.egui_ctx);
            let mut state = AppState::new(settings);
            state.load();
            Ok(Box::new(RulinAtlasApp::new(state)))
        }),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
