use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use scrape_core::{Pagination, ProceedPaths, QueryPair, ScrapeOptions, ValidationError, Variables};
use scrape_engine::ExecutorSettings;
use serde::Deserialize;

/// Top-level RON configuration for the fund_stats binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub endpoint: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long to wait for each scrape to settle before giving up on it.
    #[serde(default = "default_settle_timeout_secs")]
    pub settle_timeout_secs: u64,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub scrapes: Vec<ScrapeConfig>,
}

/// One paginated query to scrape to completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    pub name: String,
    pub document: String,
    /// Follow-up document; defaults to `document`.
    #[serde(default)]
    pub next_document: Option<String>,
    pub proceed_paths: Vec<String>,
    pub page_size: usize,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub page_size_variable: Option<String>,
    #[serde(default)]
    pub options: ScrapeOptions,
    #[serde(default)]
    pub variables: Variables,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_settle_timeout_secs() -> u64 {
    300
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = ron::from_str(content)?;
        for scrape in &config.scrapes {
            scrape
                .query_pair()
                .and_then(|_| scrape.proceed_paths())
                .with_context(|| format!("scrape `{}`", scrape.name))?;
        }
        Ok(config)
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            headers: self.headers.clone(),
            ..ExecutorSettings::for_endpoint(self.endpoint.clone())
        }
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }
}

impl ScrapeConfig {
    pub fn query_pair(&self) -> Result<QueryPair, ValidationError> {
        let next = self
            .next_document
            .clone()
            .unwrap_or_else(|| self.document.clone());
        let pair = QueryPair::new(
            self.document.clone(),
            next,
            self.page_size,
            self.pagination.clone(),
        )?;
        Ok(match &self.page_size_variable {
            Some(variable) => pair.with_page_size_variable(variable.clone()),
            None => pair,
        })
    }

    pub fn proceed_paths(&self) -> Result<ProceedPaths, ValidationError> {
        ProceedPaths::resolve(self.proceed_paths.iter().cloned())
    }
}
