pub mod deduplication;

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::constants::DATE_FORMAT;
use crate::error::Error;

/// Get config directory from environment variable or use default
pub fn get_config_dir() -> PathBuf {
    std::env::var("FINBOARD_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"))
}

/// Get market data (CSV cache) directory from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("FINBOARD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

/// Get dashboard output directory from environment variable or use default
pub fn get_output_dir() -> PathBuf {
    std::env::var("FINBOARD_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("output"))
}

/// Parse a calendar day, accepting a trailing time component
/// ("2024-01-02", "2024-01-02T00:00:00", "2024-01-02 00:00:00")
pub fn parse_day(raw: &str) -> Result<NaiveDate, Error> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("Invalid date '{}': {}", raw, e)))
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_day("2024-01-02").unwrap(), expected);
        assert_eq!(parse_day("2024-01-02T00:00:00").unwrap(), expected);
        assert_eq!(parse_day(" 2024-01-02 15:30:00 ").unwrap(), expected);
        assert!(parse_day("02/01/2024").is_err());
        assert!(parse_day("").is_err());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(10.0, 4), 10.0);
    }
}
