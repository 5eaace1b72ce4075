mod allocate;
mod budget;
mod config;
mod db;
mod error;
mod import;
mod models;
mod rules;
mod run;
mod ui;
mod usage;

use anyhow::{Context, Result};
use std::fs::OpenOptions;

use budget::{Budget, SlugIds, SystemClock};
use config::Config;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_env()?;
    let tui = args.len() == 1;
    init_logging(&config, tui)?;

    let db = db::Database::open(&config.db_path)?;
    let budget = Budget::open(
        Box::new(db),
        Box::new(SystemClock),
        Box::new(SlugIds),
        &config.default_currency,
    )?;
    log::debug!("opened budget at {}", config.db_path.display());

    if tui {
        run::as_tui(&budget)
    } else {
        run::as_cli(&args, &budget)
    }
}

/// The TUI owns the terminal, so its log lines go to a file.
fn init_logging(config: &Config, tui: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&config.log_filter);

    if tui {
        let path = config.log_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
