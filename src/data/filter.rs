use super::model::PlaceRecord;

// ---------------------------------------------------------------------------
// Threshold filter: occurrence_count >= min_count
// ---------------------------------------------------------------------------

/// Records whose occurrence count reaches `min_count`, in input order.
///
/// Thresholds below 1 behave like 1, so rows with a non-positive count never
/// reach the table through the filter. A threshold above the maximum count
/// yields nothing.
pub fn filter(records: &[PlaceRecord], min_count: i64) -> Vec<&PlaceRecord> {
    let min_count = min_count.max(1);
    records
        .iter()
        .filter(|r| r.occurrence_count >= min_count)
        .collect()
}

/// Same predicate as [`filter`], returning row indices for the table view.
pub fn filtered_indices(records: &[PlaceRecord], min_count: i64) -> Vec<usize> {
    let min_count = min_count.max(1);
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.occurrence_count >= min_count)
        .map(|(i, _)| i)
        .collect()
}

/// Map a requested threshold into the slider domain `[1, max_count]`.
/// An empty dataset has the degenerate domain `[1, 1]`.
pub fn clamp_min_count(requested: i64, max_count: Option<i64>) -> i64 {
    let upper = max_count.unwrap_or(1).max(1);
    requested.clamp(1, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(city: &str, count: i64) -> PlaceRecord {
        PlaceRecord {
            source_row: 2,
            city: city.to_string(),
            occurrence_count: count,
            related_figures: String::new(),
            context_summary: String::new(),
            latitude: 30.0,
            longitude: 120.0,
        }
    }

    fn sample() -> Vec<PlaceRecord> {
        vec![
            place("南京", 5),
            place("北京", 2),
            place("杭州", 5),
            place("扬州", 3),
            place("苏州", 1),
        ]
    }

    fn cities<'a>(records: &[&'a PlaceRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.city.as_str()).collect()
    }

    #[test]
    fn nanjing_beijing_scenario() {
        let records = vec![place("Nanjing", 5), place("Beijing", 2)];
        assert_eq!(cities(&filter(&records, 3)), vec!["Nanjing"]);
    }

    #[test]
    fn preserves_input_order() {
        let records = sample();
        assert_eq!(cities(&filter(&records, 3)), vec!["南京", "杭州", "扬州"]);
        assert_eq!(filtered_indices(&records, 3), vec![0, 2, 3]);
    }

    #[test]
    fn monotonic_in_threshold() {
        let records = sample();
        let mut previous = usize::MAX;
        for min_count in -2..=8 {
            let n = filter(&records, min_count).len();
            assert!(n <= previous, "threshold {min_count} grew the result");
            previous = n;
        }
    }

    #[test]
    fn boundaries() {
        let records = sample();
        // At the maximum: exactly the records tied for it.
        assert_eq!(cities(&filter(&records, 5)), vec!["南京", "杭州"]);
        // Above the maximum: empty.
        assert!(filter(&records, 6).is_empty());
        // At one: everything.
        assert_eq!(filter(&records, 1).len(), records.len());
    }

    #[test]
    fn non_positive_threshold_acts_like_one() {
        let mut records = sample();
        records.push(place("无名", 0));
        assert_eq!(filter(&records, 0), filter(&records, 1));
        assert_eq!(filter(&records, i64::MIN).len(), 5);
    }

    #[test]
    fn clamps_into_slider_domain() {
        assert_eq!(clamp_min_count(0, Some(5)), 1);
        assert_eq!(clamp_min_count(9, Some(5)), 5);
        assert_eq!(clamp_min_count(3, Some(5)), 3);
        assert_eq!(clamp_min_count(3, None), 1);
        assert_eq!(clamp_min_count(3, Some(0)), 1);
    }
}
