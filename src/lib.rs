pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod dimension;
pub mod error;
pub mod filter;
pub mod format;
pub mod normalize;
pub mod rank;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("kpi_dashboard", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {:?}", cli.command);
    match cli.command {
        Commands::Summary(args) => commands::summary(&args),
        Commands::Top(args) => commands::top(&args),
        Commands::Overview(args) => commands::overview(&args),
        Commands::Strategy(args) => commands::strategy(&args),
        Commands::Geography(args) => commands::geography(&args),
        Commands::Projects(args) => commands::projects(&args),
        Commands::Options(args) => commands::options(&args),
    }
}
