use std::sync::Arc;

use anyhow::{Context, Result};
use scrape_core::ScrapeView;
use scrape_engine::{QueryExecutor, ScrapeHandle};
use scrape_logging::{scrape_info, scrape_warn};

use crate::config::AppConfig;

/// Final view of one named scrape. When `timed_out` is set, `view` is the
/// last state seen before the session was abandoned.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub name: String,
    pub view: ScrapeView,
    pub timed_out: bool,
}

/// Starts every configured scrape on its own session, then waits for each to
/// settle. Sessions run concurrently with one another.
pub fn run_all(config: &AppConfig, executor: Arc<dyn QueryExecutor>) -> Result<Vec<ScrapeOutcome>> {
    let mut handles = Vec::with_capacity(config.scrapes.len());
    for scrape in &config.scrapes {
        let handle = ScrapeHandle::new(
            executor.clone(),
            scrape.query_pair()?,
            scrape.proceed_paths()?,
            scrape.options,
        )
        .with_context(|| format!("starting session for `{}`", scrape.name))?;
        scrape_info!("starting scrape {}", scrape.name);
        handle.start(scrape.variables.clone());
        handles.push((scrape.name.clone(), handle));
    }

    let timeout = config.settle_timeout();
    let outcomes = handles
        .into_iter()
        .map(|(name, handle)| match handle.wait_settled(timeout) {
            Some(view) => {
                scrape_info!(
                    "scrape {} settled: phase={:?} requests={}",
                    name,
                    view.phase,
                    view.requests
                );
                ScrapeOutcome {
                    name,
                    view,
                    timed_out: false,
                }
            }
            None => {
                scrape_warn!("scrape {} did not settle within {:?}", name, timeout);
                let view = handle.view();
                handle.detach();
                ScrapeOutcome {
                    name,
                    view,
                    timed_out: true,
                }
            }
        })
        .collect();
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use scrape_core::{PageResponse, Phase, QueryRequest, TransportError, TransportErrorKind};
    use serde_json::{json, Map, Value};

    /// Serves `funds` from a fixed list of five, two per page; fails `fundCounts`;
    /// never answers `stuck` within a test's patience.
    struct FixtureExecutor;

    #[async_trait]
    impl QueryExecutor for FixtureExecutor {
        async fn execute(&self, request: &QueryRequest) -> Result<PageResponse, TransportError> {
            if request.document.contains("stuck") {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            }
            if request.document.contains("fundCounts") {
                return Err(TransportError::new(
                    TransportErrorKind::HttpStatus(500),
                    "boom",
                ));
            }
            let skip = request
                .variables
                .get("skip")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize;
            let funds: Vec<Value> = (0..5)
                .skip(skip)
                .take(2)
                .map(|id| json!({ "id": id }))
                .collect();
            let mut data = Map::new();
            data.insert("funds".into(), Value::Array(funds));
            Ok(PageResponse::new(data))
        }
    }

    const CONFIG: &str = r#"
(
    endpoint: "http://unused.invalid",
    settle_timeout_secs: 10,
    scrapes: [
        (
            name: "funds",
            document: "query { funds }",
            proceed_paths: ["funds"],
            page_size: 2,
        ),
        (
            name: "counts",
            document: "query { fundCounts }",
            proceed_paths: ["fundCounts"],
            page_size: 2,
        ),
    ],
)
"#;

    #[test]
    fn runs_every_scrape_to_a_settled_view() {
        let config = AppConfig::parse(CONFIG).unwrap();
        let outcomes = run_all(&config, Arc::new(FixtureExecutor)).unwrap();

        assert_eq!(outcomes.len(), 2);
        let funds = &outcomes[0];
        assert_eq!(funds.name, "funds");
        assert!(!funds.timed_out);
        assert_eq!(funds.view.phase, Phase::Complete);
        assert_eq!(funds.view.data.items("funds").len(), 5);
        assert_eq!(funds.view.requests, 3);

        let counts = &outcomes[1];
        assert_eq!(counts.view.phase, Phase::Errored);
        assert!(counts.view.error.is_some());
    }

    #[test]
    fn timed_out_scrape_reports_the_view_it_was_abandoned_in() {
        let config = AppConfig::parse(
            r#"(
                endpoint: "http://unused.invalid",
                settle_timeout_secs: 1,
                scrapes: [
                    (
                        name: "stuck",
                        document: "query { stuck }",
                        proceed_paths: ["stuck"],
                        page_size: 2,
                    ),
                ],
            )"#,
        )
        .unwrap();
        let outcomes = run_all(&config, Arc::new(FixtureExecutor)).unwrap();

        let stuck = &outcomes[0];
        assert!(stuck.timed_out);
        assert_eq!(stuck.view.generation, 1);
        assert_eq!(stuck.view.phase, Phase::Fetching { page: 0 });
        assert!(stuck.view.loading);
    }
}
