use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{format_number, RunContext};
use crate::error::Error;
use crate::models::{Domain, InstrumentCatalog, MacroPoint, PriceBar, SyncStats};
use crate::services::bcra::BcraClient;
use crate::services::data912::Data912Client;
use crate::services::data_sync::Synchronizer;
use crate::services::local_store::CsvStore;
use crate::services::remote_fetcher::{RemoteFetcher, RetryPolicy};
use crate::services::report::{emit_macro_report, emit_market_report, generated_at, latest_day};

/// What a domain run did
#[derive(Debug)]
pub struct DomainReport {
    pub domain: Domain,
    pub instruments: usize,
    pub with_data: usize,
    pub reported: usize,
    pub latest: Option<NaiveDate>,
    pub stats: SyncStats,
    /// Output directory, `None` when nothing was worth reporting
    pub output: Option<PathBuf>,
}

impl DomainReport {
    pub fn print(&self) {
        let mode = if self.stats.cache_only > 0 { " (offline)" } else { "" };
        println!(
            "📊 {}{}: {}/{} instruments with data, {} new rows",
            self.domain.label(),
            mode,
            self.with_data,
            self.instruments,
            format_number(self.stats.rows_added)
        );
        if let Some(latest) = self.latest {
            println!("   Data through {}", latest);
        }
        if !self.stats.empty.is_empty() {
            println!("   ⚠️  No data: {}", self.stats.empty.join(", "));
        }
        println!(
            "   {} files written, {} up to date, {} unchanged",
            self.stats.files_written(),
            self.stats.up_to_date,
            self.stats.no_change
        );
        if self.stats.failed > 0 {
            println!("   ❌ {} instruments skipped after store errors", self.stats.failed);
        }
        match &self.output {
            Some(dir) => println!("   ✅ {} instruments reported → {}", self.reported, dir.display()),
            None => println!("   ⚠️  Nothing to report, no files written"),
        }
    }
}

pub fn run(ctx: &RunContext, domain: Domain) {
    match run_domain(ctx, domain) {
        Ok(report) => report.print(),
        Err(e) => {
            eprintln!("❌ {} failed: {}", domain.label(), e);
            std::process::exit(1);
        }
    }
}

/// Sync and report one domain. Errors only on configuration or output
/// problems; per-instrument failures are part of the report.
pub fn run_domain(ctx: &RunContext, domain: Domain) -> Result<DomainReport, Error> {
    let catalog = InstrumentCatalog::load(&ctx.config_dir, domain)?;
    info!(domain = %domain, instruments = catalog.instrument_count(), offline = ctx.config.offline, "Starting run");

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        if domain.is_price_domain() {
            run_price_domain(ctx, domain, &catalog).await
        } else {
            run_macro_domain(ctx, &catalog).await
        }
    })
}

async fn run_price_domain(ctx: &RunContext, domain: Domain, catalog: &InstrumentCatalog) -> Result<DomainReport, Error> {
    let mut config = ctx.config.clone();
    if let Some(window) = catalog.volume_window {
        config.volume_window = window;
    }

    let store: CsvStore<PriceBar> = CsvStore::new(&ctx.data_dir, domain);
    let client = Data912Client::new(&config.data912_base_url, domain)?;
    let fetcher = RemoteFetcher::new(client, RetryPolicy::from_config(&config));
    let sync = Synchronizer::new(store, fetcher, &config)?;

    let batch = sync.sync_all(&catalog.instruments).await;

    let stamp = generated_at(Utc::now(), config.calendar()?.timezone);
    let written = emit_market_report(
        &ctx.output_dir,
        domain,
        catalog,
        &batch.series,
        config.volume_window,
        config.top_n,
        stamp,
    )?;

    let (output, reported) = match written {
        Some((dir, export)) => (Some(dir), export.tickers.len()),
        None => {
            warn!(domain = %domain, "No instrument produced usable data, report not written");
            (None, 0)
        }
    };

    Ok(DomainReport {
        domain,
        instruments: catalog.instrument_count(),
        with_data: batch.series.len(),
        reported,
        latest: latest_day(&batch.series),
        stats: batch.stats,
        output,
    })
}

async fn run_macro_domain(ctx: &RunContext, catalog: &InstrumentCatalog) -> Result<DomainReport, Error> {
    let config = &ctx.config;

    let store: CsvStore<MacroPoint> = CsvStore::new(&ctx.data_dir, Domain::Macro);
    let client = BcraClient::new(config)?;
    let fetcher = RemoteFetcher::new(client, RetryPolicy::from_config(config));
    let sync = Synchronizer::new(store, fetcher, config)?;

    let batch = sync.sync_all(&catalog.instruments).await;

    let stamp = generated_at(Utc::now(), config.calendar()?.timezone);
    let written = emit_macro_report(&ctx.output_dir, catalog, &batch.series, stamp)?;

    let (output, reported) = match written {
        Some((dir, export)) => (Some(dir), export.variables.0.len()),
        None => {
            warn!(domain = %Domain::Macro, "No variable produced usable data, report not written");
            (None, 0)
        }
    };

    Ok(DomainReport {
        domain: Domain::Macro,
        instruments: catalog.instrument_count(),
        with_data: batch.series.len(),
        reported,
        latest: latest_day(&batch.series),
        stats: batch.stats,
        output,
    })
}
