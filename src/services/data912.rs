//! data912 historical prices (equities and bonds)
//!
//! `GET {base}/historical/{stocks|bonds}/{ticker}` returns a JSON array:
//!
//! ```json
//! [{"date": "2024-01-02", "o": 10.0, "h": 11.0, "l": 9.5, "c": 10.5, "v": 12345.0, "dr": 0.01}]
//! ```
//!
//! The endpoint has no date filter, so every call returns the full history.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::constants::HTTP_TIMEOUT_SECS;
use crate::error::Error;
use crate::models::{Domain, Instrument, PriceBar};
use crate::services::remote_fetcher::RemoteSource;
use crate::utils::parse_day;

/// Raw row with the API's short keys; extra keys (`dr`, ...) are ignored
#[derive(Debug, Deserialize)]
struct Data912Row {
    date: String,
    #[serde(default)]
    o: Option<f64>,
    #[serde(default)]
    h: Option<f64>,
    #[serde(default)]
    l: Option<f64>,
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    v: Option<f64>,
}

impl Data912Row {
    /// `None` for rows without a close price
    fn into_bar(self) -> Result<Option<PriceBar>, Error> {
        let date = parse_day(&self.date)?;
        let Some(close) = self.c else {
            return Ok(None);
        };
        let volume = self.v.filter(|v| v.is_finite() && *v > 0.0).map(|v| v.round() as u64).unwrap_or(0);

        Ok(Some(PriceBar::new(
            date,
            self.o.unwrap_or(close),
            self.h.unwrap_or(close),
            self.l.unwrap_or(close),
            close,
            volume,
        )))
    }
}

/// Parse a data912 response body, keeping only rows after `since`
pub fn parse_history(body: &str, since: Option<NaiveDate>) -> Result<Vec<PriceBar>, Error> {
    let rows: Vec<Data912Row> = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to parse data912 response: {}", e)))?;

    let mut bars = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(bar) = row.into_bar()? {
            if since.map_or(true, |s| bar.date > s) {
                bars.push(bar);
            }
        }
    }
    Ok(bars)
}

pub struct Data912Client {
    base_url: String,
    domain: Domain,
    client: reqwest::Client,
}

impl Data912Client {
    pub fn new(base_url: &str, domain: Domain) -> Result<Self, Error> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid data912 base url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }
        if domain.data912_path().is_none() {
            return Err(Error::InvalidInput(format!("data912 has no {} endpoint", domain)));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            domain,
            client,
        })
    }

    pub fn url_for(&self, instrument: &Instrument) -> String {
        format!(
            "{}/historical/{}/{}",
            self.base_url,
            self.domain.data912_path().unwrap_or_default(),
            instrument.id
        )
    }
}

#[async_trait]
impl RemoteSource<PriceBar> for Data912Client {
    fn name(&self) -> &str {
        "data912"
    }

    async fn fetch_once(&self, instrument: &Instrument, since: Option<NaiveDate>) -> Result<Vec<PriceBar>, Error> {
        let url = self.url_for(instrument);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {} (url: {})", e, url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("{} returned status {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        parse_history(&body, since)
    }
}
