use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Latest-day metrics for one instrument. Computed each run, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub id: String,
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub prior_close: f64,
    /// `(last / prior - 1) * 100`
    pub daily_return_pct: f64,
    pub last_volume: u64,
    /// Mean volume over the trailing window, excluding the last day
    pub baseline_volume: Option<f64>,
    /// `last_volume / baseline_volume`
    pub volume_ratio: Option<f64>,
}

/// Market sentiment bucket derived from breadth and mean return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    BroadBullish,
    ModerateBullish,
    BroadBearish,
    ModerateBearish,
    Mixed,
}

impl Sentiment {
    /// Dashboard label
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::BroadBullish => "Alcista amplio",
            Sentiment::ModerateBullish => "Alcista moderado",
            Sentiment::BroadBearish => "Bajista amplio",
            Sentiment::ModerateBearish => "Bajista moderado",
            Sentiment::Mixed => "Mixto / Sin tendencia",
        }
    }

    /// Badge color (CSS hex)
    pub fn color(&self) -> &'static str {
        match self {
            Sentiment::BroadBullish => "#22c55e",
            Sentiment::ModerateBullish => "#86efac",
            Sentiment::BroadBearish => "#ef4444",
            Sentiment::ModerateBearish => "#fca5a5",
            Sentiment::Mixed => "#94a3b8",
        }
    }
}

/// Breadth and return statistics across a basket
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSummary {
    pub total: usize,
    pub advances: usize,
    pub declines: usize,
    pub unchanged: usize,
    /// `advances / declines`; `f64::INFINITY` when nothing declined
    pub ad_ratio: f64,
    pub mean_return: f64,
    pub median_return: f64,
    /// Sample standard deviation; `None` for fewer than two returns
    pub std_return: Option<f64>,
    pub sentiment: Sentiment,
}

/// Aggregate for one sector / bond type
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub advances: usize,
    pub declines: usize,
    pub mean_return: f64,
}

/// Best and worst daily returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopMovers {
    /// Highest return first
    pub gainers: Vec<MetricsSnapshot>,
    /// Lowest return first
    pub losers: Vec<MetricsSnapshot>,
}

/// Latest value and variations of a macro variable
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSnapshot {
    pub id: String,
    pub last_value: f64,
    pub last_date: NaiveDate,
    pub change_30d_pct: Option<f64>,
    pub change_1y_pct: Option<f64>,
}
