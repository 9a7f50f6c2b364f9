//! Logger setup for the fund_stats binary.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Where log records go. The report itself always goes to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogDestination {
    /// Only the log file.
    File,
    /// Only stderr.
    Terminal,
    /// Stderr and the log file.
    Both,
}

impl LogDestination {
    fn to_terminal(self) -> bool {
        matches!(self, Self::Terminal | Self::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

pub fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. Fails if the log file cannot be created.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_file: &Path) -> Result<()> {
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);

    if destination.to_terminal() {
        // Stderr keeps stdout clean for the report.
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if destination.to_file() {
        let file = File::create(log_file)
            .with_context(|| format!("creating log file {}", log_file.display()))?;
        loggers.push(WriteLogger::new(level, config, file));
    }

    // A logger may already be installed (tests); keep it.
    let _ = CombinedLogger::init(loggers);
    Ok(())
}

fn logger_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build()
}
