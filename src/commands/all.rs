use std::time::Instant;

use super::domain::{run_domain, DomainReport};
use super::RunContext;
use crate::error::Error;
use crate::models::Domain;

/// Outcome of one domain inside `all`
pub struct DomainResult {
    pub domain: Domain,
    pub result: Result<DomainReport, Error>,
}

impl DomainResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every domain in sequence; a failing domain never stops the others
pub fn run_all_domains(ctx: &RunContext) -> Vec<DomainResult> {
    Domain::all()
        .into_iter()
        .map(|domain| DomainResult {
            domain,
            result: run_domain(ctx, domain),
        })
        .collect()
}

pub fn run(ctx: &RunContext) {
    let start = Instant::now();
    println!("🚀 Updating all dashboards{}\n", if ctx.config.offline { " (offline)" } else { "" });

    let results = run_all_domains(ctx);

    println!("\n═══════════════════════════════════════════════════════════");
    for r in &results {
        match &r.result {
            Ok(report) => {
                println!("[OK]    {}", r.domain);
                report.print();
            }
            Err(e) => println!("[ERROR] {}: {}", r.domain, e),
        }
    }
    println!("═══════════════════════════════════════════════════════════");

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    println!(
        "\n⏱️  {} domains in {:.1}s, {} failed",
        results.len(),
        start.elapsed().as_secs_f64(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}
