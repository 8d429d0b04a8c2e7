use chrono::NaiveDate;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::models::{Dated, FetchProgress, Instrument, Series, SyncConfig, SyncStats};
use crate::services::calendar::ReferenceCalendar;
use crate::services::local_store::SeriesStore;
use crate::services::remote_fetcher::{RemoteFetcher, RemoteSource};

/// How one instrument's pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No local data, full fetch returned rows, written
    Persisted { rows: usize },
    /// Incremental fetch added rows, merged and written
    Merged { added: usize, total: usize },
    /// Latest stored day already covers today, no fetch
    UpToDate,
    /// Fetch returned nothing usable, store untouched
    NoChange,
    /// Offline run, store returned as is
    CacheOnly,
}

impl SyncOutcome {
    /// Whether the pass hit the network
    pub fn fetched(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Persisted { .. } | SyncOutcome::Merged { .. } | SyncOutcome::NoChange
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Persisted { .. } => "persisted",
            SyncOutcome::Merged { .. } => "merged",
            SyncOutcome::UpToDate => "up-to-date",
            SyncOutcome::NoChange => "no-change",
            SyncOutcome::CacheOnly => "cache-only",
        }
    }
}

/// Result of a whole-domain sync
#[derive(Debug)]
pub struct SyncBatch<T> {
    /// Non-empty series, in catalog order
    pub series: Vec<(Instrument, Series<T>)>,
    pub stats: SyncStats,
}

/// Reconciles the local store with a remote source, one instrument at a time
pub struct Synchronizer<T, St, S> {
    store: St,
    fetcher: RemoteFetcher<S>,
    calendar: ReferenceCalendar,
    offline: bool,
    fetch_delay: Duration,
    _record: PhantomData<T>,
}

impl<T, St, S> Synchronizer<T, St, S>
where
    T: Dated + Clone + Send,
    St: SeriesStore<T>,
    S: RemoteSource<T>,
{
    pub fn new(store: St, fetcher: RemoteFetcher<S>, config: &SyncConfig) -> Result<Self, Error> {
        Ok(Self {
            store,
            fetcher,
            calendar: config.calendar()?,
            offline: config.offline,
            fetch_delay: config.fetch_delay,
            _record: PhantomData,
        })
    }

    /// Bring one instrument up to date. Only store errors are returned;
    /// remote failures end as `NoChange`.
    pub async fn sync_instrument(&self, instrument: &Instrument) -> Result<(Series<T>, SyncOutcome), Error> {
        let local = self.store.load(instrument)?;

        if self.offline {
            return Ok((local, SyncOutcome::CacheOnly));
        }

        let Some(latest) = local.latest_date() else {
            return self.full_fetch(instrument).await;
        };

        if self.calendar.is_up_to_date(latest) {
            debug!(instrument = %instrument.id, %latest, "Already up to date");
            return Ok((local, SyncOutcome::UpToDate));
        }

        self.incremental_fetch(instrument, local, latest).await
    }

    async fn full_fetch(&self, instrument: &Instrument) -> Result<(Series<T>, SyncOutcome), Error> {
        let fetched: Vec<T> = self.fetcher.fetch(instrument, None).await;
        if fetched.is_empty() {
            return Ok((Series::new(), SyncOutcome::NoChange));
        }

        let series = Series::from_unsorted(fetched);
        self.store.save(instrument, &series)?;

        let rows = series.len();
        Ok((series, SyncOutcome::Persisted { rows }))
    }

    async fn incremental_fetch(
        &self,
        instrument: &Instrument,
        local: Series<T>,
        latest: NaiveDate,
    ) -> Result<(Series<T>, SyncOutcome), Error> {
        let fetched: Vec<T> = self
            .fetcher
            .fetch(instrument, Some(latest))
            .await
            .into_iter()
            .filter(|row| row.date() > latest)
            .collect();

        if fetched.is_empty() {
            return Ok((local, SyncOutcome::NoChange));
        }

        let before = local.len();
        let merged = local.merged_with(fetched);
        self.store.save(instrument, &merged)?;

        let total = merged.len();
        Ok((
            merged,
            SyncOutcome::Merged {
                added: total - before,
                total,
            },
        ))
    }

    /// Sync every instrument sequentially, pausing after each remote fetch.
    /// A failing instrument is logged and left out; it never stops the batch.
    pub async fn sync_all(&self, instruments: &[Instrument]) -> SyncBatch<T> {
        let start = Instant::now();
        let total = instruments.len();
        let mut stats = SyncStats::new();
        let mut series = Vec::with_capacity(total);

        for (i, instrument) in instruments.iter().enumerate() {
            let instrument_start = Instant::now();
            let result = self.sync_instrument(instrument).await;

            let mut progress = FetchProgress::new(i + 1, total, instrument.id.clone());
            progress.elapsed = instrument_start.elapsed();

            match result {
                Ok((data, outcome)) => {
                    debug!("{} | {}", progress.format_display(), outcome.label());
                    match outcome {
                        SyncOutcome::Persisted { rows } => {
                            stats.persisted += 1;
                            stats.rows_added += rows;
                        }
                        SyncOutcome::Merged { added, .. } => {
                            stats.merged += 1;
                            stats.rows_added += added;
                        }
                        SyncOutcome::UpToDate => stats.up_to_date += 1,
                        SyncOutcome::NoChange => stats.no_change += 1,
                        SyncOutcome::CacheOnly => stats.cache_only += 1,
                    }

                    if outcome.fetched() && !self.fetch_delay.is_zero() {
                        tokio::time::sleep(self.fetch_delay).await;
                    }

                    if data.is_empty() {
                        stats.empty.push(instrument.id.clone());
                    } else {
                        series.push((instrument.clone(), data));
                    }
                }
                Err(e) => {
                    warn!(instrument = %instrument.id, error = %e, "{} | store error, skipped", progress.format_display());
                    stats.failed += 1;
                }
            }
        }

        info!(
            instruments = total,
            with_data = series.len(),
            persisted = stats.persisted,
            merged = stats.merged,
            up_to_date = stats.up_to_date,
            no_change = stats.no_change,
            cache_only = stats.cache_only,
            failed = stats.failed,
            rows_added = stats.rows_added,
            "Sync finished in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        SyncBatch { series, stats }
    }
}
