use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, RunContext};
use crate::models::{Domain, SyncConfig};
use crate::utils::{get_config_dir, get_data_dir, get_output_dir, parse_day};

#[derive(Parser)]
#[command(name = "finboard")]
#[command(about = "Argentine market dashboards from an incremental CSV cache", long_about = None)]
pub struct Cli {
    /// Directory holding stocks.json, bonds.json and macro.json
    #[arg(long, global = true, env = "FINBOARD_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Root of the per-domain CSV cache
    #[arg(long, global = true, env = "FINBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Root of the generated dashboards
    #[arg(long, global = true, env = "FINBOARD_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// IANA timezone that defines the reference calendar day
    #[arg(long, global = true, env = "FINBOARD_TIMEZONE")]
    pub timezone: Option<String>,

    /// Pretend today is this day (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_today)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync equities and build the stocks dashboard
    Stocks {
        /// Use the local cache only, no network
        #[arg(long)]
        offline: bool,
    },
    /// Sync sovereign and corporate bonds and build the bonds dashboard
    Bonds {
        #[arg(long)]
        offline: bool,
    },
    /// Sync BCRA variables and build the macro dashboard
    Macro {
        #[arg(long)]
        offline: bool,
    },
    /// Run stocks, bonds and macro in sequence
    All {
        #[arg(long)]
        offline: bool,
    },
    /// Show what the local cache holds
    Status,
}

fn parse_today(raw: &str) -> Result<NaiveDate, String> {
    parse_day(raw).map_err(|e| e.to_string())
}

impl Cli {
    fn context(&self, offline: bool) -> RunContext {
        let mut config = SyncConfig::from_env();
        config.offline = offline;
        if let Some(tz) = &self.timezone {
            config.timezone = tz.clone();
        }
        if self.today.is_some() {
            config.today = self.today;
        }

        RunContext {
            config_dir: self.config_dir.clone().unwrap_or_else(get_config_dir),
            data_dir: self.data_dir.clone().unwrap_or_else(get_data_dir),
            output_dir: self.output_dir.clone().unwrap_or_else(get_output_dir),
            config,
        }
    }
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stocks { offline } => {
            commands::domain::run(&cli.context(offline), Domain::Stocks);
        }
        Commands::Bonds { offline } => {
            commands::domain::run(&cli.context(offline), Domain::Bonds);
        }
        Commands::Macro { offline } => {
            commands::domain::run(&cli.context(offline), Domain::Macro);
        }
        Commands::All { offline } => {
            commands::all::run(&cli.context(offline));
        }
        Commands::Status => {
            commands::status::run(&cli.context(true));
        }
    }
}
