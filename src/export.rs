use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::data::cache::DatasetCache;
use crate::data::filter::filter;
use crate::data::model::{ColumnMap, PlaceRecord};
use crate::map::marker::build_markers;
use crate::map::render::render_map;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Options of the headless `export` command.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub out: PathBuf,
    pub table: Option<PathBuf>,
    pub min_count: i64,
    pub probe_tiles: bool,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub records: usize,
    pub markers: usize,
    pub skipped: usize,
    pub map_written: bool,
    pub table_rows: Option<usize>,
}

/// Load the dataset, write the map page and optionally the filtered table.
///
/// Load failures abort before anything is written. Map failures are logged
/// and the table is still written.
pub fn run(settings: &Settings, options: &ExportOptions) -> Result<ExportSummary> {
    let mut cache = DatasetCache::new();
    let dataset = cache
        .get_or_load(&settings.data.path, &settings.data.columns)
        .with_context(|| format!("Failed to load {}", settings.data.path.display()))?;

    let batch = build_markers(&dataset.records);

    let map_result = if options.probe_tiles {
        settings.tiles.probe(PROBE_TIMEOUT)
    } else {
        Ok(())
    }
    .and_then(|()| render_map(&batch.markers, &settings.map, &settings.tiles))
    .and_then(|artifact| artifact.write_to(&options.out));

    let map_written = match map_result {
        Ok(()) => true,
        Err(e) => {
            log::error!("Map not written, continuing with the table: {e}");
            false
        }
    };

    let table_rows = match &options.table {
        Some(path) => {
            let rows = filter(&dataset.records, options.min_count);
            write_table(path, &rows, &settings.data.columns)?;
            log::info!(
                "Wrote {} rows with count >= {} to {}",
                rows.len(),
                options.min_count,
                path.display()
            );
            Some(rows.len())
        }
        None => None,
    };

    Ok(ExportSummary {
        records: dataset.len(),
        markers: batch.len(),
        skipped: batch.skipped.len(),
        map_written,
        table_rows,
    })
}

/// Write records as CSV under the source column labels.
pub fn write_table(path: &Path, records: &[&PlaceRecord], columns: &ColumnMap) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create table file: {}", path.display()))?;
    writer.write_record(columns.labels())?;
    for r in records {
        writer.write_record([
            r.city.clone(),
            r.occurrence_count.to_string(),
            r.related_figures.clone(),
            r.context_summary.clone(),
            format_coordinate(r.latitude),
            format_coordinate(r.longitude),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn format_coordinate(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}
