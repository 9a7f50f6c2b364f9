mod cli;
mod config;
mod logging;
mod report;
mod runner;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use scrape_engine::{write_snapshot, ReqwestExecutor};
use scrape_logging::{scrape_error, scrape_info};

use crate::cli::Args;
use crate::config::AppConfig;
use crate::report::FundReport;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::initialize(args.log, logging::level(args.verbose), &args.log_file)?;

    let mut config = AppConfig::load(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    scrape_info!(
        "fund_stats: {} scrapes against {}",
        config.scrapes.len(),
        config.endpoint
    );

    let executor = Arc::new(
        ReqwestExecutor::new(config.executor_settings()).context("building HTTP client")?,
    );
    let outcomes = runner::run_all(&config, executor)?;

    if let Some(dir) = &args.output {
        let fetched_utc = chrono::Utc::now().to_rfc3339();
        for outcome in &outcomes {
            let path = write_snapshot(
                dir,
                &format!("{}.json", outcome.name),
                &outcome.view,
                &fetched_utc,
            )
            .with_context(|| format!("writing snapshot for `{}`", outcome.name))?;
            scrape_info!("snapshot written to {}", path.display());
        }
    }

    let report = FundReport::from_views(outcomes.iter().map(|o| &o.view), args.usd_rate);
    print!("{}", report::render(&report));

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.timed_out || o.view.error.is_some())
        .map(|o| o.name.as_str())
        .collect();
    for outcome in outcomes.iter().filter(|o| o.view.error.is_some()) {
        if let Some(err) = &outcome.view.error {
            scrape_error!("scrape {} failed: {}", outcome.name, err);
        }
    }
    if !failed.is_empty() {
        bail!("incomplete scrapes: {}", failed.join(", "));
    }
    Ok(())
}
