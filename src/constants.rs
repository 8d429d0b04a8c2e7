//! Shared constants
//!
//! Defaults for the sync pipeline, the metrics calculator and the report
//! emitter. Anything tunable per run is carried by `SyncConfig`; these are the
//! values it starts from.

/// Attempts per remote fetch before giving up on an instrument for this run
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between retry attempts
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// Pause after every remote fetch to respect upstream rate limits
pub const DEFAULT_FETCH_DELAY_MS: u64 = 200;

/// Per-request HTTP timeout
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Trailing periods used for the volume baseline (equities and bonds)
pub const DEFAULT_VOLUME_WINDOW: usize = 20;

/// Days of history requested from the BCRA API on first download
pub const DEFAULT_MACRO_LOOKBACK_DAYS: i64 = 730;

/// Calendar day that defines "today" for the up-to-date check
pub const DEFAULT_TIMEZONE: &str = "America/Argentina/Buenos_Aires";

/// Number of gainers/losers listed in the report
pub const DEFAULT_TOP_N: usize = 10;

/// Categories with fewer members are left out of the category breakdown
pub const MIN_CATEGORY_SIZE: usize = 3;

/// Minimum last-volume / baseline ratio for the volume outlier list
pub const VOLUME_OUTLIER_RATIO: f64 = 2.0;

pub const DATA912_BASE_URL: &str = "https://data912.com";
pub const BCRA_BASE_URL: &str = "https://api.bcra.gob.ar/estadisticas/v4.0";

/// Date format used on disk, in URLs and in the JSON export
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentiment thresholds on (advance/decline ratio, mean return %)
///
/// | Bucket           | Condition                     |
/// |------------------|-------------------------------|
/// | broad bullish    | ratio >= 2.0 and mean >= 0.5  |
/// | moderate bullish | ratio >= 1.2 and mean >= 0.0  |
/// | broad bearish    | ratio <= 0.5 and mean <= -0.5 |
/// | moderate bearish | ratio <= 0.8 and mean <= 0.0  |
/// | mixed            | otherwise                     |
pub mod sentiment {
    pub const BROAD_BULL_RATIO: f64 = 2.0;
    pub const BROAD_BULL_MEAN: f64 = 0.5;
    pub const MODERATE_BULL_RATIO: f64 = 1.2;
    pub const MODERATE_BULL_MEAN: f64 = 0.0;
    pub const BROAD_BEAR_RATIO: f64 = 0.5;
    pub const BROAD_BEAR_MEAN: f64 = -0.5;
    pub const MODERATE_BEAR_RATIO: f64 = 0.8;
    pub const MODERATE_BEAR_MEAN: f64 = 0.0;
}

/// Cutoffs for the executive summary narrative
pub mod narrative {
    /// Advance/decline ratio at or above which breadth reads as positive
    pub const POSITIVE_BREADTH_RATIO: f64 = 1.5;
    /// Advance/decline ratio at or below which breadth reads as negative
    pub const NEGATIVE_BREADTH_RATIO: f64 = 0.67;
    /// Sample stddev of daily returns (%) above which dispersion is high
    pub const HIGH_DISPERSION_STD: f64 = 2.0;
}
