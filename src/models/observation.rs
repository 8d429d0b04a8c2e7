use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Anything keyed by a calendar day.
///
/// The synchronizer, the local store and the deduplication helpers only need
/// this; they are shared by price bars and macro points.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Daily OHLCV bar for an equity or a bond
///
/// CSV layout: `date,open,high,low,close,volume`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading day (no time component)
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Traded volume
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl Dated for PriceBar {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// One published value of a macro variable (reserves, rates, inflation...)
///
/// CSV layout: `date,value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl MacroPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

impl Dated for MacroPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
