//! Per-instrument CSV cache
//!
//! Layout: `{data_dir}/{domain}/{file_stem}.csv`, header row with the field
//! names, one row per day in ascending order.
//!
//! - Missing file loads as an empty series (first run)
//! - Rows are normalised through `Series::from_unsorted` on load
//! - Writes are atomic: write `<file>.csv.tmp`, flush, rename into place

use crate::error::Error;
use crate::models::{Dated, Domain, Instrument, Series};
use crate::utils::deduplication::{count_duplicates, duplicate_dates};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Persistence seam used by the synchronizer
pub trait SeriesStore<T> {
    fn load(&self, instrument: &Instrument) -> Result<Series<T>, Error>;
    fn save(&self, instrument: &Instrument, series: &Series<T>) -> Result<(), Error>;
}

/// Summary of a cached file, for `status`
#[derive(Debug, Clone)]
pub struct StoreInfo<T> {
    pub path: PathBuf,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub last: Option<T>,
}

/// CSV-backed store for one domain
#[derive(Debug, Clone)]
pub struct CsvStore<T> {
    dir: PathBuf,
    _record: PhantomData<T>,
}

impl<T> CsvStore<T>
where
    T: Dated + Serialize + DeserializeOwned + Clone,
{
    /// Store rooted at `{data_dir}/{domain}`
    pub fn new(data_dir: &Path, domain: Domain) -> Self {
        Self::at(domain.dir_in(data_dir))
    }

    /// Store rooted at an explicit directory
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _record: PhantomData,
        }
    }

    pub fn path_for(&self, instrument: &Instrument) -> PathBuf {
        self.dir.join(format!("{}.csv", instrument.file_stem()))
    }

    /// Row count and date range of the cached file, `None` when missing
    pub fn inspect(&self, instrument: &Instrument) -> Result<Option<StoreInfo<T>>, Error> {
        let path = self.path_for(instrument);
        if !path.exists() {
            return Ok(None);
        }

        let series = self.read(instrument)?;
        Ok(Some(StoreInfo {
            path,
            rows: series.len(),
            first_date: series.first_date(),
            last_date: series.latest_date(),
            last: series.last().cloned(),
        }))
    }

    fn read(&self, instrument: &Instrument) -> Result<Series<T>, Error> {
        let path = self.path_for(instrument);
        if !path.exists() {
            return Ok(Series::new());
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<T>().enumerate() {
            let row = record.map_err(|e| {
                Error::Parse(format!("{} line {}: {}", path.display(), line + 2, e))
            })?;
            rows.push(row);
        }

        let duplicates = count_duplicates(&rows);
        if duplicates > 0 {
            tracing::warn!(
                file = %path.display(),
                removed = duplicates,
                dates = ?duplicate_dates(&rows),
                "Dropped duplicate dates from cached file"
            );
        }
        Ok(Series::from_unsorted(rows))
    }

    fn write(&self, instrument: &Instrument, series: &Series<T>) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Io(format!("Failed to create {}: {}", self.dir.display(), e)))?;

        let path = self.path_for(instrument);
        let tmp_path = path.with_extension("csv.tmp");

        let written = Self::write_rows(&tmp_path, series).and_then(|()| {
            fs::rename(&tmp_path, &path)
                .map_err(|e| Error::Io(format!("Atomic rename to {} failed: {}", path.display(), e)))
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        tracing::debug!(file = %path.display(), rows = series.len(), "Saved series");
        Ok(())
    }

    fn write_rows(tmp_path: &Path, series: &Series<T>) -> Result<(), Error> {
        let mut writer = csv::Writer::from_path(tmp_path)?;
        for row in series.iter() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<T> SeriesStore<T> for CsvStore<T>
where
    T: Dated + Serialize + DeserializeOwned + Clone,
{
    fn load(&self, instrument: &Instrument) -> Result<Series<T>, Error> {
        self.read(instrument)
    }

    fn save(&self, instrument: &Instrument, series: &Series<T>) -> Result<(), Error> {
        self.write(instrument, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MacroPoint, PriceBar};
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> PriceBar {
        PriceBar::new(day(d), close - 1.0, close + 1.0, close - 2.0, close, 1_000 * d as u64)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<PriceBar> = CsvStore::new(tmp.path(), Domain::Stocks);
        let ggal = Instrument::new("GGAL");

        assert!(store.load(&ggal).unwrap().is_empty());
        assert_eq!(store.load(&ggal).unwrap().latest_date(), None);
        assert!(store.inspect(&ggal).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<PriceBar> = CsvStore::new(tmp.path(), Domain::Stocks);
        let ggal = Instrument::new("GGAL");
        let series = Series::from_unsorted(vec![bar(2, 105.0), bar(1, 100.0)]);

        store.save(&ggal, &series).unwrap();

        let path = tmp.path().join("stocks").join("GGAL.csv");
        assert_eq!(store.path_for(&ggal), path);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,open,high,low,close,volume\n2024-01-01,"));
        assert!(!path.with_extension("csv.tmp").exists());

        let loaded = store.load(&ggal).unwrap();
        assert_eq!(loaded, series);
        assert_eq!(store.inspect(&ggal).unwrap().unwrap().last_date, Some(day(2)));
    }

    #[test]
    fn test_save_is_byte_stable() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<MacroPoint> = CsvStore::new(tmp.path(), Domain::Macro);
        let reserves = Instrument::new("1");
        let series = Series::from_unsorted(vec![
            MacroPoint::new(day(1), 27_000.5),
            MacroPoint::new(day(2), 27_010.25),
        ]);

        store.save(&reserves, &series).unwrap();
        let first = fs::read(store.path_for(&reserves)).unwrap();

        let reloaded = store.load(&reserves).unwrap();
        store.save(&reserves, &reloaded).unwrap();
        let second = fs::read(store.path_for(&reserves)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_hand_edited_file_is_normalised() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<MacroPoint> = CsvStore::at(tmp.path());
        let reserves = Instrument::new("1");
        fs::write(
            store.path_for(&reserves),
            "date,value\n2024-01-03,3.0\n2024-01-01,1.0\n2024-01-03,30.0\n",
        )
        .unwrap();

        let series = store.load(&reserves).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(day(1)));
        assert_eq!(series.last().unwrap().value, 30.0);
    }

    #[test]
    fn test_file_stem_override_and_inspect() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<MacroPoint> = CsvStore::at(tmp.path());
        let mut reserves = Instrument::new("1");
        reserves.file = Some("reservas".to_string());

        let series = Series::from_unsorted(vec![MacroPoint::new(day(5), 1.0), MacroPoint::new(day(9), 2.0)]);
        store.save(&reserves, &series).unwrap();

        assert!(tmp.path().join("reservas.csv").exists());
        let info = store.inspect(&reserves).unwrap().unwrap();
        assert_eq!(info.rows, 2);
        assert_eq!(info.first_date, Some(day(5)));
        assert_eq!(info.last_date, Some(day(9)));
        assert_eq!(info.last.unwrap().value, 2.0);
    }

    #[test]
    fn test_corrupted_row_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<MacroPoint> = CsvStore::at(tmp.path());
        let reserves = Instrument::new("1");
        fs::write(store.path_for(&reserves), "date,value\nnot-a-date,1.0\n").unwrap();

        assert!(matches!(store.load(&reserves), Err(Error::Parse(_))));
    }

    #[derive(Debug, Clone, serde::Deserialize)]
    struct Unwritable {
        date: NaiveDate,
    }

    impl Serialize for Unwritable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("row cannot be written"))
        }
    }

    impl Dated for Unwritable {
        fn date(&self) -> NaiveDate {
            self.date
        }
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store: CsvStore<Unwritable> = CsvStore::at(tmp.path());
        let ggal = Instrument::new("GGAL");
        let path = store.path_for(&ggal);
        fs::write(&path, "date\n2024-01-01\n").unwrap();

        let series = Series::from_unsorted(vec![Unwritable { date: day(2) }]);
        assert!(store.save(&ggal, &series).is_err());

        assert!(!path.with_extension("csv.tmp").exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "date\n2024-01-01\n");
    }
}
