use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogDestination;

/// Scrapes every page of the configured fund queries and prints statistics.
#[derive(Debug, Parser)]
#[command(name = "fund_stats", version, about)]
pub struct Args {
    /// RON file describing the endpoint and the scrapes to run.
    #[arg(short, long, default_value = "demos/funds.ron")]
    pub config: PathBuf,

    /// Overrides the endpoint from the config file.
    #[arg(long, env = "FUND_STATS_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Log file used when `--log` is `file` or `both`.
    #[arg(long, default_value = "scrape.log")]
    pub log_file: PathBuf,

    #[arg(short, long)]
    pub verbose: bool,

    /// ETH to USD rate used for the assets-under-management line.
    #[arg(long)]
    pub usd_rate: Option<f64>,

    /// Directory for per-scrape JSON snapshots.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
