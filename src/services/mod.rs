pub mod bcra;
pub mod calendar;
pub mod data912;
pub mod data_sync;
pub mod local_store;
pub mod macro_stats;
pub mod market_stats;
pub mod remote_fetcher;
pub mod report;

pub use calendar::ReferenceCalendar;
pub use data_sync::{SyncBatch, SyncOutcome, Synchronizer};
pub use local_store::{CsvStore, SeriesStore};
pub use remote_fetcher::{RemoteFetcher, RemoteSource, RetryPolicy};
