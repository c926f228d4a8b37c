use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{CellValue, ColumnMap, Dataset, PlaceRecord, SourceSignature};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a place table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, header in row 1
/// * `.csv`     – header row with column labels
/// * `.json`    – `[{ "城市": "南京", "出现次数": 5, ... }, ...]`
/// * `.parquet` – one column per label, any scalar types
///
/// The schema is checked once here; rows then become typed [`PlaceRecord`]s.
pub fn load_file(path: &Path, columns: &ColumnMap) -> Result<Dataset, LoadError> {
    let source = SourceSignature::read(path).map_err(|e| LoadError::missing_file(path, e))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_workbook(path)?,
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let records = table.into_records(columns)?;
    log::info!(
        "Loaded {} place records from {}",
        records.len(),
        path.display()
    );

    Ok(Dataset::new(records, path.to_path_buf(), source))
}

// ---------------------------------------------------------------------------
// Raw table → typed records
// ---------------------------------------------------------------------------

/// Header labels plus untyped rows, as read from any supported format.
#[derive(Debug, Default)]
struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

/// One data row and its 1-based row number in the source (header = 1).
#[derive(Debug)]
struct RawRow {
    source_row: usize,
    cells: Vec<CellValue>,
}

impl RawTable {
    fn into_records(self, columns: &ColumnMap) -> Result<Vec<PlaceRecord>, LoadError> {
        let index = ColumnIndex::resolve(&self.headers, columns)?;

        Ok(self
            .rows
            .into_iter()
            .filter(|row| !row.cells.iter().all(CellValue::is_empty))
            .map(|row| index.record(&row))
            .collect())
    }
}

/// Positions of the required columns within a header row.
#[derive(Debug)]
struct ColumnIndex {
    city: usize,
    occurrence_count: usize,
    related_figures: usize,
    context_summary: usize,
    latitude: usize,
    longitude: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], columns: &ColumnMap) -> Result<Self, LoadError> {
        let normalized: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();

        let mut missing = Vec::new();
        let mut find = |label: &str| {
            let pos = normalized.iter().position(|h| *h == label.trim());
            if pos.is_none() {
                missing.push(label.to_string());
            }
            pos.unwrap_or(usize::MAX)
        };

        let index = ColumnIndex {
            city: find(&columns.city),
            occurrence_count: find(&columns.occurrence_count),
            related_figures: find(&columns.related_figures),
            context_summary: find(&columns.context_summary),
            latitude: find(&columns.latitude),
            longitude: find(&columns.longitude),
        };

        if missing.is_empty() {
            Ok(index)
        } else {
            Err(LoadError::SchemaMismatch { missing })
        }
    }

    fn record(&self, row: &RawRow) -> PlaceRecord {
        let row_no = row.source_row;
        let cell = |idx: usize| row.cells.get(idx).cloned().unwrap_or(CellValue::Null);

        let count_cell = cell(self.occurrence_count);
        let occurrence_count = count_cell.as_count().unwrap_or_else(|| {
            log::debug!("Row {row_no}: occurrence count {count_cell:?} is not an integer");
            0
        });

        PlaceRecord {
            source_row: row_no,
            city: cell(self.city).to_text(),
            occurrence_count,
            related_figures: cell(self.related_figures).to_text(),
            context_summary: cell(self.context_summary).to_text(),
            latitude: coordinate(&cell(self.latitude), row_no, "latitude"),
            longitude: coordinate(&cell(self.longitude), row_no, "longitude"),
        }
    }
}

fn coordinate(cell: &CellValue, row_no: usize, axis: &str) -> f64 {
    cell.as_f64().unwrap_or_else(|| {
        log::debug!("Row {row_no}: {axis} {cell:?} is not a number");
        f64::NAN
    })
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

/// First worksheet of an Excel / OpenDocument workbook; row 1 is the header.
fn load_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::malformed(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::malformed(path, "workbook has no worksheets"))?
        .map_err(|e| LoadError::malformed(path, e))?;

    // The range starts at the first used cell, which need not be A1.
    let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| workbook_cell(c).to_text()).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .enumerate()
        .map(|(i, row)| RawRow {
            source_row: header_row + 1 + i,
            cells: row.iter().map(workbook_cell).collect(),
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column labels, every cell kept as text and
/// typed later by the record builder.
fn load_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::malformed(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::malformed(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LoadError::malformed(path, e))?;
        // Line where the record starts; blank lines and quoted line breaks
        // make this differ from the record count.
        let source_row = record
            .position()
            .map_or(i + 2, |pos| pos.line() as usize);
        let cells = record
            .iter()
            .map(|value| {
                if value.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::String(value.to_string())
                }
            })
            .collect();
        rows.push(RawRow { source_row, cells });
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "城市": "南京", "出现次数": 5, "纬度": 32.06, "经度": 118.78, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::malformed(path, e))?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| LoadError::malformed(path, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::malformed(path, "expected a top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::malformed(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .enumerate()
        .map(|(i, obj)| RawRow {
            source_row: i + 2,
            cells: headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect(),
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per label.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::missing_file(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| LoadError::malformed(path, e))?;
    let headers = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| LoadError::malformed(path, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::malformed(path, e))?;
        for row in 0..batch.num_rows() {
            rows.push(RawRow {
                source_row: rows.len() + 2,
                cells: batch
                    .columns()
                    .iter()
                    .map(|col| arrow_cell(col, row))
                    .collect(),
            });
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let typed = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };

    typed.unwrap_or_else(|| match array_value_to_string(col, row) {
        Ok(s) => CellValue::String(s),
        Err(_) => CellValue::Null,
    })
}
