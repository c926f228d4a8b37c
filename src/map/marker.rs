use crate::color::MarkerStyle;
use crate::data::model::{PlaceRecord, RecordValidationWarning};

use super::escape::{escape_html, escape_multiline};

/// Pixels of marker radius per occurrence.
pub const RADIUS_SCALE: i64 = 2;

// ---------------------------------------------------------------------------
// MarkerDescriptor – one renderable place
// ---------------------------------------------------------------------------

/// Everything needed to draw one place on a map. Rebuilt from the full
/// record set on every render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDescriptor {
    /// Index of the record in `Dataset::records` (not the source row).
    pub row: usize,
    pub lat: f64,
    pub lng: f64,
    /// Circle radius in screen pixels.
    pub radius: f64,
    pub style: MarkerStyle,
    /// Escaped popup markup, safe to hand to an HTML renderer.
    pub popup_html: String,
    /// Plain hover text (the city name, unescaped).
    pub tooltip: String,
    pub occurrence_count: i64,
}

/// Builder output: the markers plus one warning per skipped record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerBatch {
    pub markers: Vec<MarkerDescriptor>,
    pub skipped: Vec<RecordValidationWarning>,
}

impl MarkerBatch {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Turn every valid record into a marker, in input order. Invalid records
/// are skipped, logged, and reported in [`MarkerBatch::skipped`].
pub fn build_markers(records: &[PlaceRecord]) -> MarkerBatch {
    let mut batch = MarkerBatch::default();

    for (row, record) in records.iter().enumerate() {
        match record.validate() {
            Ok(()) => batch.markers.push(MarkerDescriptor {
                row,
                lat: record.latitude,
                lng: record.longitude,
                radius: record.occurrence_count.saturating_mul(RADIUS_SCALE) as f64,
                style: MarkerStyle::crimson(),
                popup_html: popup_html(record),
                tooltip: record.city.clone(),
                occurrence_count: record.occurrence_count,
            }),
            Err(warning) => {
                log::warn!("{warning}");
                batch.skipped.push(warning);
            }
        }
    }

    if !batch.skipped.is_empty() {
        log::warn!(
            "{} of {} records were left off the map",
            batch.skipped.len(),
            records.len()
        );
    }
    batch
}

/// Popup markup: city heading, then count, figures and context lines.
pub fn popup_html(record: &PlaceRecord) -> String {
    format!(
        "<div class=\"place-popup\">\
         <h4>{city}</h4>\
         <hr>\
         <p><strong>出现次数：</strong>{count}次</p>\
         <p><strong>相关人物：</strong>{figures}</p>\
         <p><strong>关键事件：</strong>{context}</p>\
         </div>",
        city = escape_html(&record.city),
        count = record.occurrence_count,
        figures = escape_multiline(&record.related_figures),
        context = escape_multiline(&record.context_summary),
    )
}
