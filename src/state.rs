use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::data::cache::DatasetCache;
use crate::data::error::LoadError;
use crate::data::filter::{clamp_min_count, filtered_indices};
use crate::data::model::Dataset;
use crate::map::marker::{build_markers, MarkerBatch, MarkerDescriptor};
use crate::map::render::{render_map, RenderError};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Session-owned cache; never shared with other sessions.
    cache: DatasetCache,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    /// Markers for every valid record, rebuilt when the dataset changes.
    pub markers: MarkerBatch,

    /// Table threshold, always within `[1, max_count]`.
    pub min_count: i64,

    /// Row indices passing the threshold (cached).
    pub visible_rows: Vec<usize>,

    /// Whether the unfiltered table is shown as well.
    pub show_raw_data: bool,

    /// Marker whose popup is open, as an index into `markers.markers`.
    pub selected_marker: Option<usize>,

    /// Set when the preview should jump back to the configured view.
    pub reset_view: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Last map page written by "Export map…".
    pub last_export: Option<PathBuf>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cache: DatasetCache::new(),
            dataset: None,
            markers: MarkerBatch::default(),
            min_count: 1,
            visible_rows: Vec::new(),
            show_raw_data: false,
            selected_marker: None,
            reset_view: true,
            status_message: None,
            last_export: None,
        }
    }

    /// Load the configured source, from the cache when it is unchanged.
    pub fn load(&mut self) {
        let path = self.settings.data.path.clone();
        let result = self.cache.get_or_load(&path, &self.settings.data.columns);
        self.apply_load(result);
    }

    /// Drop the cached copy of the configured source and read it again.
    pub fn reload(&mut self) {
        let path = self.settings.data.path.clone();
        let result = self.cache.reload(&path, &self.settings.data.columns);
        self.apply_load(result);
    }

    /// Switch to another source file.
    pub fn open(&mut self, path: &Path) {
        self.settings.data.path = path.to_path_buf();
        self.load();
    }

    fn apply_load(&mut self, result: Result<Arc<Dataset>, LoadError>) {
        match result {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load dataset: {e}");
                self.dataset = None;
                self.markers = MarkerBatch::default();
                self.visible_rows.clear();
                self.selected_marker = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset: rebuild markers, re-clamp the threshold.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let unchanged = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));

        if !unchanged {
            self.markers = build_markers(&dataset.records);
            self.selected_marker = None;
        }
        self.status_message = if dataset.is_empty() {
            Some(format!("{} has no data rows", dataset.path.display()))
        } else {
            match self.markers.skipped.len() {
                0 => None,
                n => Some(format!("{n} rows could not be placed on the map")),
            }
        };
        self.dataset = Some(dataset);
        self.set_min_count(self.min_count);
    }

    pub fn max_count(&self) -> i64 {
        self.dataset
            .as_ref()
            .and_then(|ds| ds.max_count())
            .unwrap_or(1)
            .max(1)
    }

    /// Change the table threshold and recompute the visible rows.
    pub fn set_min_count(&mut self, requested: i64) {
        let max = self.dataset.as_ref().and_then(|ds| ds.max_count());
        self.min_count = clamp_min_count(requested, max);
        self.refilter();
    }

    /// Recompute `visible_rows` after a threshold change.
    pub fn refilter(&mut self) {
        self.visible_rows = match &self.dataset {
            Some(ds) => filtered_indices(&ds.records, self.min_count),
            None => Vec::new(),
        };
    }

    pub fn selected(&self) -> Option<&MarkerDescriptor> {
        self.selected_marker
            .and_then(|idx| self.markers.markers.get(idx))
    }

    /// Write the map page for every valid record. The table is unaffected
    /// by failures here.
    pub fn export_map(&mut self, path: &Path) -> Result<(), RenderError> {
        let artifact = render_map(&self.markers.markers, &self.settings.map, &self.settings.tiles)?;
        artifact.write_to(path)?;
        self.last_export = Some(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "城市,出现次数,主要相关人物,关键事件 / 语境,纬度,经度\n\
                       南京,5,杜少卿,泰伯祠,32.06,118.78\n\
                       北京,2,范进,会试,39.9,116.4\n\
                       杭州,4,马二先生,游西湖,,\n";

    fn state_with_data(dir: &Path) -> AppState {
        let path = dir.join("places.csv");
        std::fs::write(&path, CSV).unwrap();
        let mut settings = Settings::default();
        settings.data.path = path;
        let mut state = AppState::new(settings);
        state.load();
        state
    }

    #[test]
    fn load_builds_markers_and_shows_everything() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_data(dir.path());

        assert_eq!(state.dataset.as_ref().unwrap().len(), 3);
        assert_eq!(state.markers.len(), 2);
        assert_eq!(state.markers.skipped.len(), 1);
        assert_eq!(state.visible_rows, vec![0, 1, 2]);
        assert_eq!(state.max_count(), 5);
        assert!(state.status_message.is_some());
    }

    #[test]
    fn threshold_filters_table_but_not_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with_data(dir.path());

        state.set_min_count(3);
        assert_eq!(state.visible_rows, vec![0, 2]);
        assert_eq!(state.markers.len(), 2);

        state.set_min_count(99);
        assert_eq!(state.min_count, 5);
        assert_eq!(state.visible_rows, vec![0]);

        state.set_min_count(-4);
        assert_eq!(state.min_count, 1);
        assert_eq!(state.visible_rows.len(), 3);
    }

    #[test]
    fn repeated_load_keeps_dataset_and_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with_data(dir.path());
        let first = state.dataset.clone().unwrap();
        state.selected_marker = Some(1);

        state.load();
        assert!(Arc::ptr_eq(&first, state.dataset.as_ref().unwrap()));
        assert_eq!(state.selected().map(|m| m.tooltip.as_str()), Some("北京"));

        state.reload();
        assert!(!Arc::ptr_eq(&first, state.dataset.as_ref().unwrap()));
        assert_eq!(state.selected_marker, None);
    }

    #[test]
    fn header_only_source_is_reported_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, CSV.lines().next().unwrap()).unwrap();
        let mut state = AppState::new(Settings::default());
        state.open(&path);

        assert!(state.dataset.as_ref().unwrap().is_empty());
        assert!(state.markers.is_empty());
        assert_eq!(state.min_count, 1);
        assert!(state.status_message.as_deref().unwrap().ends_with("has no data rows"));
    }

    #[test]
    fn failed_load_clears_the_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with_data(dir.path());

        state.open(&dir.path().join("missing.xlsx"));
        assert!(state.dataset.is_none());
        assert!(state.markers.is_empty());
        assert!(state.visible_rows.is_empty());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
    }

    #[test]
    fn export_writes_the_full_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with_data(dir.path());
        state.set_min_count(5);

        let out = dir.path().join("map.html");
        state.export_map(&out).unwrap();
        let html = std::fs::read_to_string(&out).unwrap();
        assert_eq!(html.matches("\"radius\":").count(), 2);
        assert_eq!(state.last_export.as_deref(), Some(out.as_path()));
    }
}
