/// Data layer: place records, loading, caching and filtering.
///
/// ```text
///  rulinwaishi_stats.xlsx | .csv | .json | .parquet
///        │
///        ▼
///   loader ── RawTable ─ schema check (ColumnMap) ─▶ Dataset { Vec<PlaceRecord> }
///        │
///        ▼
///   cache  ── Arc<Dataset> per (path, ColumnMap), reused while mtime/len hold
///        │
///        ▼
///   filter ── occurrence_count >= min_count ─▶ table rows
/// ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
