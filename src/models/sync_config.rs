use chrono::NaiveDate;
use std::time::Duration;

use crate::constants::{
    BCRA_BASE_URL, DATA912_BASE_URL, DEFAULT_FETCH_DELAY_MS, DEFAULT_MACRO_LOOKBACK_DAYS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TIMEZONE, DEFAULT_TOP_N,
    DEFAULT_VOLUME_WINDOW,
};
use crate::error::Error;
use crate::services::calendar::ReferenceCalendar;

/// Configuration for one domain run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Use the local cache only, never touch the network
    pub offline: bool,

    /// Attempts per remote fetch
    pub max_attempts: u32,

    /// Fixed pause between attempts
    pub retry_backoff: Duration,

    /// Pause after each remote fetch
    pub fetch_delay: Duration,

    /// Trailing window for the volume baseline
    pub volume_window: usize,

    /// Gainers/losers listed in the report
    pub top_n: usize,

    /// Days requested from BCRA when there is no local history
    pub macro_lookback_days: i64,

    pub data912_base_url: String,
    pub bcra_base_url: String,

    /// Skip TLS certificate verification for the BCRA endpoint
    pub accept_invalid_certs: bool,

    /// IANA timezone whose calendar day is "today"
    pub timezone: String,

    /// Fixed "today" (reproducible runs, tests)
    pub today: Option<NaiveDate>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            offline: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            fetch_delay: Duration::from_millis(DEFAULT_FETCH_DELAY_MS),
            volume_window: DEFAULT_VOLUME_WINDOW,
            top_n: DEFAULT_TOP_N,
            macro_lookback_days: DEFAULT_MACRO_LOOKBACK_DAYS,
            data912_base_url: DATA912_BASE_URL.to_string(),
            bcra_base_url: BCRA_BASE_URL.to_string(),
            accept_invalid_certs: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            today: None,
        }
    }
}

impl SyncConfig {
    /// Defaults, with endpoints and timezone taken from the environment when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DATA912_BASE_URL") {
            config.data912_base_url = url;
        }
        if let Ok(url) = std::env::var("BCRA_BASE_URL") {
            config.bcra_base_url = url;
        }
        if let Ok(tz) = std::env::var("FINBOARD_TIMEZONE") {
            config.timezone = tz;
        }
        config
    }

    /// Calendar that decides what "today" is for this run
    pub fn calendar(&self) -> Result<ReferenceCalendar, Error> {
        let calendar = ReferenceCalendar::from_name(&self.timezone)?;
        Ok(match self.today {
            Some(day) => calendar.with_override(day),
            None => calendar,
        })
    }

    /// Same settings with no sleeping, for tests and offline runs
    pub fn without_delays(mut self) -> Self {
        self.retry_backoff = Duration::ZERO;
        self.fetch_delay = Duration::ZERO;
        self
    }
}

/// Progress line for one instrument of a batch
#[derive(Debug, Clone)]
pub struct FetchProgress {
    /// Current instrument index (1-based)
    pub current: usize,

    /// Total number of instruments
    pub total: usize,

    pub instrument: String,

    /// Time spent on this instrument
    pub elapsed: Duration,
}

impl FetchProgress {
    pub fn new(current: usize, total: usize, instrument: String) -> Self {
        Self {
            current,
            total,
            instrument,
            elapsed: Duration::ZERO,
        }
    }

    pub fn format_display(&self) -> String {
        format!(
            "[{:03}/{:03}] {} | {:.1}s",
            self.current,
            self.total,
            self.instrument,
            self.elapsed.as_secs_f64(),
        )
    }
}

/// Statistics for a batch sync
#[derive(Debug, Default, Clone)]
pub struct SyncStats {
    /// First download that produced data
    pub persisted: usize,
    /// Incremental fetch that added rows
    pub merged: usize,
    /// Latest stored day is already today
    pub up_to_date: usize,
    /// Fetch returned nothing new (includes exhausted retries)
    pub no_change: usize,
    /// Offline run, cache returned as is
    pub cache_only: usize,
    /// Store errors, instrument excluded from this run
    pub failed: usize,
    /// Rows appended across all instruments
    pub rows_added: usize,
    /// Instruments that ended the run without any data
    pub empty: Vec<String>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_written(&self) -> usize {
        self.persisted + self.merged
    }
}
