mod domain;
mod instrument;
mod metrics;
mod observation;
mod series;
mod sync_config;

pub use domain::Domain;
pub use instrument::{Instrument, InstrumentCatalog};
pub use metrics::{CategoryStats, MacroSnapshot, MarketSummary, MetricsSnapshot, Sentiment, TopMovers};
pub use observation::{Dated, MacroPoint, PriceBar};
pub use series::Series;
pub use sync_config::{FetchProgress, SyncConfig, SyncStats};

