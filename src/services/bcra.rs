//! BCRA monetary statistics API
//!
//! `GET {base}/Monetarias/{id}?desde=YYYY-MM-DD&hasta=YYYY-MM-DD`
//!
//! The payload has moved between API versions; all of these are accepted:
//! - `{"results": {"detalle": [{"fecha": ..., "valor": ...}]}}`
//! - `{"results": [{"idVariable": 1, "detalle": [...]}]}`
//! - `{"results": [{"fecha": ..., "valor": ...}]}`

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::header::{HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::constants::HTTP_TIMEOUT_SECS;
use crate::error::Error;
use crate::models::{Instrument, MacroPoint, SyncConfig};
use crate::services::calendar::ReferenceCalendar;
use crate::services::remote_fetcher::RemoteSource;
use crate::utils::{format_day, parse_day};

#[derive(Debug, Deserialize)]
struct BcraRow {
    fecha: String,
    #[serde(default)]
    valor: Option<f64>,
}

/// Extract `{fecha, valor}` rows from any of the accepted response shapes.
/// Rows without a value are skipped.
pub fn parse_results(body: &str) -> Result<Vec<MacroPoint>, Error> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("Failed to parse BCRA response: {}", e)))?;

    let rows = match json.get("results") {
        Some(Value::Object(obj)) => obj.get("detalle").cloned().unwrap_or(Value::Array(Vec::new())),
        Some(Value::Array(items)) => match items.first().and_then(|first| first.get("detalle")) {
            Some(detalle) => detalle.clone(),
            None => Value::Array(items.clone()),
        },
        _ => Value::Array(Vec::new()),
    };

    let rows: Vec<BcraRow> = serde_json::from_value(rows)
        .map_err(|e| Error::Parse(format!("Unexpected BCRA row layout: {}", e)))?;

    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(value) = row.valor {
            points.push(MacroPoint::new(parse_day(&row.fecha)?, value));
        }
    }
    Ok(points)
}

pub struct BcraClient {
    base_url: String,
    calendar: ReferenceCalendar,
    lookback_days: i64,
    client: reqwest::Client,
}

impl BcraClient {
    pub fn new(config: &SyncConfig) -> Result<Self, Error> {
        let base_url = config.bcra_base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid BCRA base url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            calendar: config.calendar()?,
            lookback_days: config.macro_lookback_days,
            client,
        })
    }

    /// `(desde, hasta)` for a fetch: the day after `since`, or the lookback
    /// window on first download; always up to today
    pub fn date_range(&self, since: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
        let today = self.calendar.today();
        let desde = match since {
            Some(last) => last + ChronoDuration::days(1),
            None => today - ChronoDuration::days(self.lookback_days),
        };
        (desde, today)
    }

    pub fn url_for(&self, instrument: &Instrument, since: Option<NaiveDate>) -> String {
        let (desde, hasta) = self.date_range(since);
        format!(
            "{}/Monetarias/{}?desde={}&hasta={}",
            self.base_url,
            instrument.id,
            format_day(desde),
            format_day(hasta)
        )
    }
}

#[async_trait]
impl RemoteSource<MacroPoint> for BcraClient {
    fn name(&self) -> &str {
        "bcra"
    }

    async fn fetch_once(&self, instrument: &Instrument, since: Option<NaiveDate>) -> Result<Vec<MacroPoint>, Error> {
        let (desde, hasta) = self.date_range(since);
        if desde > hasta {
            return Ok(Vec::new());
        }

        let url = self.url_for(instrument, since);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
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

        parse_results(&body)
    }
}
