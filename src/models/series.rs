use crate::models::Dated;
use crate::utils::deduplication::dedup_keep_last;
use chrono::NaiveDate;

/// Ordered history of one instrument.
///
/// Invariant: strictly increasing by date, so no two observations share a
/// day. Every constructor goes through `dedup_keep_last`, which is the only
/// way observations get in.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    observations: Vec<T>,
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            observations: Vec::new(),
        }
    }
}

impl<T: Dated> Series<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from rows in any order, possibly with repeated dates.
    /// Later rows win over earlier rows for the same date.
    pub fn from_unsorted(rows: Vec<T>) -> Self {
        Self {
            observations: dedup_keep_last(rows),
        }
    }

    /// Merge freshly fetched rows into this series.
    ///
    /// Stored rows come first and fetched rows second, so on a date collision
    /// the fetched value supersedes the stored one.
    pub fn merged_with(self, fetched: Vec<T>) -> Self {
        let mut rows = self.observations;
        rows.extend(fetched);
        Self::from_unsorted(rows)
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(Dated::date)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(Dated::date)
    }

    pub fn last(&self) -> Option<&T> {
        self.observations.last()
    }

    pub fn observations(&self) -> &[T] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.observations.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.observations
    }
}
