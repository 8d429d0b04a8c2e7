use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tokio::time::sleep;

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS};
use crate::error::Error;
use crate::models::{Instrument, SyncConfig};

/// One upstream HTTP API that returns dated rows for an instrument.
///
/// `since` is advisory: a source may return older rows, the synchronizer
/// filters them out anyway.
#[async_trait]
pub trait RemoteSource<T>: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_once(&self, instrument: &Instrument, since: Option<NaiveDate>) -> Result<Vec<T>, Error>;
}

/// Bounded retry with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff,
        }
    }
}

/// Wraps a source with retries. `fetch` never fails: once attempts are
/// exhausted the instrument simply has no new data this run.
pub struct RemoteFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S> RemoteFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch<T>(&self, instrument: &Instrument, since: Option<NaiveDate>) -> Vec<T>
    where
        S: RemoteSource<T>,
        T: Send,
    {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.source.fetch_once(instrument, since).await {
                Ok(rows) => {
                    tracing::debug!(
                        source = self.source.name(),
                        instrument = %instrument.id,
                        rows = rows.len(),
                        attempt,
                        "Fetched rows"
                    );
                    return rows;
                }
                Err(e) => {
                    if attempt < attempts {
                        tracing::info!(
                            source = self.source.name(),
                            instrument = %instrument.id,
                            "Fetch attempt {}/{} failed: {}, retrying in {:.1}s",
                            attempt,
                            attempts,
                            e,
                            self.policy.backoff.as_secs_f64()
                        );
                        sleep(self.policy.backoff).await;
                    } else {
                        tracing::warn!(
                            source = self.source.name(),
                            instrument = %instrument.id,
                            error = %e,
                            "Giving up after {} attempts",
                            attempts
                        );
                    }
                }
            }
        }

        Vec::new()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::models::PriceBar;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory source: fixed rows per instrument, optional leading failures,
    /// and a log of every call.
    #[derive(Default)]
    pub struct MockSource {
        pub rows: HashMap<String, Vec<PriceBar>>,
        /// Instrument id -> number of calls that fail before succeeding
        pub failures: Mutex<HashMap<String, u32>>,
        /// Instrument ids that always fail
        pub broken: Vec<String>,
        pub calls: Mutex<Vec<(String, Option<NaiveDate>)>>,
    }

    impl MockSource {
        pub fn with_rows(rows: HashMap<String, Vec<PriceBar>>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_for(&self, id: &str) -> Vec<Option<NaiveDate>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(i, _)| i == id)
                .map(|(_, since)| *since)
                .collect()
        }
    }

    #[async_trait]
    impl RemoteSource<PriceBar> for MockSource {
        fn name(&self) -> &str {
            "mock"
        }

        async fn fetch_once(&self, instrument: &Instrument, since: Option<NaiveDate>) -> Result<Vec<PriceBar>, Error> {
            self.calls.lock().unwrap().push((instrument.id.clone(), since));

            if self.broken.contains(&instrument.id) {
                return Err(Error::Network("connection refused".to_string()));
            }
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(&instrument.id) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(Error::Network("HTTP 503".to_string()));
                    }
                }
            }

            Ok(self.rows.get(&instrument.id).cloned().unwrap_or_default())
        }
    }
}
