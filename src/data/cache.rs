use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::LoadError;
use super::loader::load_file;
use super::model::{ColumnMap, Dataset, SourceSignature};

// ---------------------------------------------------------------------------
// Session-scoped dataset cache
// ---------------------------------------------------------------------------

/// Memoizes loaded datasets for one session.
///
/// Entries are keyed by canonical source path and column map. A lookup
/// re-reads only the file's metadata; the dataset is reloaded when its
/// modification signature changed or after an explicit [`invalidate`].
/// Datasets are handed out as `Arc` and never mutated.
///
/// [`invalidate`]: DatasetCache::invalidate
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<CacheKey, Arc<Dataset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    columns: ColumnMap,
}

impl CacheKey {
    fn new(path: &Path, columns: &ColumnMap) -> Self {
        CacheKey {
            path: std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            columns: columns.clone(),
        }
    }
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it on a miss or when the
    /// source changed since it was cached.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        columns: &ColumnMap,
    ) -> Result<Arc<Dataset>, LoadError> {
        let key = CacheKey::new(path, columns);
        let current = SourceSignature::read(path).map_err(|e| LoadError::missing_file(path, e))?;

        if let Some(dataset) = self.entries.get(&key) {
            if dataset.source == current {
                log::debug!("Dataset cache hit for {}", path.display());
                return Ok(Arc::clone(dataset));
            }
            log::debug!("Source {} changed, reloading", path.display());
        } else {
            log::debug!("Dataset cache miss for {}", path.display());
        }

        let dataset = Arc::new(load_file(path, columns)?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop every entry for `path` and load it again.
    pub fn reload(&mut self, path: &Path, columns: &ColumnMap) -> Result<Arc<Dataset>, LoadError> {
        self.invalidate(path);
        self.get_or_load(path, columns)
    }

    /// Drop every entry for `path`. Returns whether anything was cached.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let before = self.entries.len();
        self.entries.retain(|key, _| key.path != canonical);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
