//! Date-keyed deduplication
//!
//! Every series is keyed by calendar day. When two observations share a day
//! the later one in input order wins, so "concatenate stored rows, then
//! fetched rows" always lets the fetched value supersede the stored one.

use crate::models::Dated;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Drop duplicate dates keeping the LAST occurrence, then sort ascending.
///
/// The sort is stable, so input that is already ordered keeps its order.
pub fn dedup_keep_last<T: Dated>(records: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(records.len());
    let mut kept: Vec<T> = Vec::with_capacity(records.len());

    // Walk backwards so the first key we see is the last occurrence
    for record in records.into_iter().rev() {
        if seen.insert(record.date()) {
            kept.push(record);
        }
    }

    kept.reverse();
    kept.sort_by_key(|r| r.date());
    kept
}

/// Count how many records share a date with an earlier record
pub fn count_duplicates<T: Dated>(records: &[T]) -> usize {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().filter(|r| !seen.insert(r.date())).count()
}

/// Dates that appear more than once, with their counts (debugging aid)
pub fn duplicate_dates<T: Dated>(records: &[T]) -> Vec<(NaiveDate, usize)> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.date()).or_insert(0) += 1;
    }

    let mut dups: Vec<(NaiveDate, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    dups.sort();
    dups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MacroPoint;

    fn point(day: u32, value: f64) -> MacroPoint {
        MacroPoint::new(NaiveDate::from_ymd_opt(2024, 3, day).unwrap(), value)
    }

    #[test]
    fn test_keep_last_occurrence() {
        let records = vec![point(1, 1.0), point(2, 2.0), point(1, 10.0)];

        let filtered = dedup_keep_last(records);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].value, 10.0); // later occurrence wins
        assert_eq!(filtered[1].value, 2.0);
    }

    #[test]
    fn test_output_sorted() {
        let records = vec![point(5, 5.0), point(3, 3.0), point(4, 4.0), point(3, 30.0)];

        let filtered = dedup_keep_last(records);
        let days: Vec<u32> = filtered.iter().map(|p| chrono::Datelike::day(&p.date)).collect();
        assert_eq!(days, vec![3, 4, 5]);
        assert_eq!(filtered[0].value, 30.0);
    }

    #[test]
    fn test_count_and_report_duplicates() {
        let records = vec![point(1, 1.0), point(1, 2.0), point(1, 3.0), point(2, 4.0)];

        assert_eq!(count_duplicates(&records), 2);
        let dups = duplicate_dates(&records);
        assert_eq!(dups, vec![(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 3)]);
    }

    #[test]
    fn test_empty_input() {
        let filtered: Vec<MacroPoint> = dedup_keep_last(Vec::new());
        assert!(filtered.is_empty());
    }
}
