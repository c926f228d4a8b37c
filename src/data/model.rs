use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from a spreadsheet, CSV, JSON or Parquet
/// source. Only lives between reading a file and building `PlaceRecord`s.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Null cells and blank strings.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view, accepting numeric text as well.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Integer view for counts. Spreadsheets hand integers back as floats,
    /// so integral floats (`5.0`) are accepted; `5.5` is not.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) => float_to_count(*v),
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_count))
            }
            _ => None,
        }
    }

    /// Free-text view: trimmed, nulls become the empty string.
    pub fn to_text(&self) -> String {
        self.to_string().trim().to_string()
    }
}

fn float_to_count(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// ColumnMap – source labels of the required columns
// ---------------------------------------------------------------------------

/// Header labels of the six required columns. The defaults are the labels
/// of the deployed statistics workbook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub city: String,
    pub occurrence_count: String,
    pub related_figures: String,
    pub context_summary: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            city: "城市".to_string(),
            occurrence_count: "出现次数".to_string(),
            related_figures: "主要相关人物".to_string(),
            context_summary: "关键事件 / 语境".to_string(),
            latitude: "纬度".to_string(),
            longitude: "经度".to_string(),
        }
    }
}

impl ColumnMap {
    /// Labels in canonical record order.
    pub fn labels(&self) -> [&str; 6] {
        [
            &self.city,
            &self.occurrence_count,
            &self.related_figures,
            &self.context_summary,
            &self.latitude,
            &self.longitude,
        ]
    }
}

// ---------------------------------------------------------------------------
// PlaceRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single place (one row of the source table).
///
/// Rows are kept even when a cell failed to parse: unparseable counts become
/// `0` and unparseable coordinates become `NaN`, and [`PlaceRecord::validate`]
/// reports them. The table view still shows such rows; the map never does.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRecord {
    /// 1-based row of the source table, header row included, so that row 2
    /// is the first data row, as a spreadsheet numbers it.
    pub source_row: usize,
    pub city: String,
    pub occurrence_count: i64,
    pub related_figures: String,
    pub context_summary: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlaceRecord {
    /// Check the rendering invariants. A failure names the source row.
    pub fn validate(&self) -> Result<(), RecordValidationWarning> {
        let reason = if self.city.trim().is_empty() {
            InvalidReason::EmptyCity
        } else if self.occurrence_count < 1 {
            InvalidReason::NonPositiveCount(self.occurrence_count)
        } else if !self.latitude.is_finite() || !self.longitude.is_finite() {
            InvalidReason::MissingCoordinates
        } else if !(-90.0..=90.0).contains(&self.latitude) {
            InvalidReason::LatitudeOutOfRange(self.latitude)
        } else if !(-180.0..=180.0).contains(&self.longitude) {
            InvalidReason::LongitudeOutOfRange(self.longitude)
        } else {
            return Ok(());
        };

        Err(RecordValidationWarning {
            row: self.source_row,
            city: self.city.clone(),
            reason,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// A row that cannot be put on the map. Non-fatal: counted and reported,
/// never propagated as an error. `row` is the record's source row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {row} ({city:?}) skipped: {reason}")]
pub struct RecordValidationWarning {
    pub row: usize,
    pub city: String,
    pub reason: InvalidReason,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidReason {
    #[error("city is empty")]
    EmptyCity,
    #[error("occurrence count {0} is not positive")]
    NonPositiveCount(i64),
    #[error("coordinates are missing or not numeric")]
    MissingCoordinates,
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Modification signature of a source file. Two loads of a file whose
/// signature did not change are assumed to yield the same records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSignature {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceSignature {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(SourceSignature {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// All records of one source, in source row order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<PlaceRecord>,
    pub path: PathBuf,
    pub source: SourceSignature,
}

impl Dataset {
    pub fn new(records: Vec<PlaceRecord>, path: PathBuf, source: SourceSignature) -> Self {
        Dataset {
            records,
            path,
            source,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest occurrence count, the upper bound of the threshold slider.
    pub fn max_count(&self) -> Option<i64> {
        self.records.iter().map(|r| r.occurrence_count).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nanjing() -> PlaceRecord {
        PlaceRecord {
            source_row: 2,
            city: "南京".to_string(),
            occurrence_count: 5,
            related_figures: "杜少卿".to_string(),
            context_summary: "秦淮河畔".to_string(),
            latitude: 32.06,
            longitude: 118.78,
        }
    }

    #[test]
    fn counts_accept_integral_floats_and_text() {
        assert_eq!(CellValue::Float(5.0).as_count(), Some(5));
        assert_eq!(CellValue::String(" 12 ".into()).as_count(), Some(12));
        assert_eq!(CellValue::String("3.0".into()).as_count(), Some(3));
        assert_eq!(CellValue::Float(2.5).as_count(), None);
        assert_eq!(CellValue::Null.as_count(), None);
        assert_eq!(CellValue::String("多次".into()).as_count(), None);
    }

    #[test]
    fn text_view_renders_numbers_and_blanks_nulls() {
        assert_eq!(CellValue::Float(5.0).to_text(), "5");
        assert_eq!(CellValue::Integer(7).to_text(), "7");
        assert_eq!(CellValue::Null.to_text(), "");
        assert!(CellValue::String("   ".into()).is_empty());
    }

    #[test]
    fn valid_record_passes() {
        assert!(nanjing().validate().is_ok());
    }

    #[test]
    fn invalid_records_name_their_reason() {
        let mut r = nanjing();
        r.occurrence_count = 0;
        r.source_row = 7;
        let w = r.validate().unwrap_err();
        assert_eq!(w.row, 7);
        assert_eq!(w.to_string(), "row 7 (\"南京\") skipped: occurrence count 0 is not positive");
        assert_eq!(w.reason, InvalidReason::NonPositiveCount(0));

        let mut r = nanjing();
        r.latitude = f64::NAN;
        assert_eq!(r.validate().unwrap_err().reason, InvalidReason::MissingCoordinates);

        let mut r = nanjing();
        r.longitude = 181.0;
        assert_eq!(
            r.validate().unwrap_err().reason,
            InvalidReason::LongitudeOutOfRange(181.0)
        );

        let mut r = nanjing();
        r.city = "  ".to_string();
        assert_eq!(r.validate().unwrap_err().reason, InvalidReason::EmptyCity);
    }

    #[test]
    fn max_count_over_records() {
        let mut beijing = nanjing();
        beijing.city = "北京".to_string();
        beijing.occurrence_count = 2;
        let ds = Dataset::new(
            vec![beijing, nanjing()],
            PathBuf::from("places.csv"),
            SourceSignature { modified: None, len: 0 },
        );
        assert_eq!(ds.max_count(), Some(5));
        assert_eq!(ds.len(), 2);
    }
}
