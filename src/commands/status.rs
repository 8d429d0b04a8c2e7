use super::{format_number, RunContext};
use crate::error::Error;
use crate::models::{Domain, InstrumentCatalog, MacroPoint, PriceBar};
use crate::services::local_store::{CsvStore, StoreInfo};

pub fn run(ctx: &RunContext) {
    println!("📊 Cache Status ({})\n", ctx.data_dir.display());

    for domain in Domain::all() {
        if let Err(e) = show_domain(ctx, domain) {
            eprintln!("⚠️  Could not read {}: {}", domain, e);
        }
        println!("\n═══════════════════════════════════════════════════════════\n");
    }

    println!("💡 Tip: run 'finboard all' to refresh every dashboard");
}

/// One status line per instrument
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub id: String,
    pub rows: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub last_value: Option<f64>,
}

impl StatusLine {
    fn missing(id: &str) -> Self {
        Self {
            id: id.to_string(),
            rows: 0,
            first_date: None,
            last_date: None,
            last_value: None,
        }
    }

    fn from_info<T>(id: &str, info: StoreInfo<T>, value: impl Fn(&T) -> f64) -> Self {
        Self {
            id: id.to_string(),
            rows: info.rows,
            first_date: info.first_date.map(|d| d.to_string()),
            last_date: info.last_date.map(|d| d.to_string()),
            last_value: info.last.as_ref().map(value),
        }
    }

    pub fn render(&self) -> String {
        match (&self.first_date, &self.last_date) {
            (Some(first), Some(last)) => format!(
                "   {:<8} {:>8} records  ({} → {})  last: {}",
                self.id,
                format_number(self.rows),
                first,
                last,
                self.last_value.map(|v| format!("{:.2}", v)).unwrap_or_default()
            ),
            _ => format!("   {:<8} {:>8}", self.id, "no data"),
        }
    }
}

/// Cache summary for every catalog instrument of a domain, in catalog order
pub fn collect_status(ctx: &RunContext, domain: Domain) -> Result<Vec<StatusLine>, Error> {
    let catalog = InstrumentCatalog::load(&ctx.config_dir, domain)?;
    let mut lines = Vec::with_capacity(catalog.instrument_count());

    match domain {
        Domain::Stocks | Domain::Bonds => {
            let store: CsvStore<PriceBar> = CsvStore::new(&ctx.data_dir, domain);
            for instrument in &catalog.instruments {
                let line = match store.inspect(instrument) {
                    Ok(Some(info)) => StatusLine::from_info(&instrument.id, info, |b: &PriceBar| b.close),
                    Ok(None) => StatusLine::missing(&instrument.id),
                    Err(e) => {
                        eprintln!("⚠️  {}: {}", instrument.id, e);
                        StatusLine::missing(&instrument.id)
                    }
                };
                lines.push(line);
            }
        }
        Domain::Macro => {
            let store: CsvStore<MacroPoint> = CsvStore::new(&ctx.data_dir, domain);
            for instrument in &catalog.instruments {
                let line = match store.inspect(instrument) {
                    Ok(Some(info)) => StatusLine::from_info(&instrument.id, info, |p: &MacroPoint| p.value),
                    Ok(None) => StatusLine::missing(&instrument.id),
                    Err(e) => {
                        eprintln!("⚠️  {}: {}", instrument.id, e);
                        StatusLine::missing(&instrument.id)
                    }
                };
                lines.push(line);
            }
        }
    }

    Ok(lines)
}

fn show_domain(ctx: &RunContext, domain: Domain) -> Result<(), Error> {
    let lines = collect_status(ctx, domain)?;
    let cached = lines.iter().filter(|l| l.rows > 0).count();

    println!("🔹 {} ({}/{} cached)", domain.label(), cached, lines.len());
    for line in &lines {
        println!("{}", line.render());
    }
    Ok(())
}
