use std::collections::VecDeque;
use std::sync::Arc;

use scrape_core::{
    update, AccumulatedResult, Effect, Msg, Phase, ProceedPaths, QueryPair, RenderPass,
    ScrapeError, ScrapeOptions, ScrapeState, ScrapeView, Variables,
};

use crate::executor::QueryExecutor;
use crate::sink::{DiscardSink, ViewSink};
use crate::ScrapeEvent;

/// Drives one scrape session on the caller's task, one page at a time.
pub struct Scraper {
    executor: Arc<dyn QueryExecutor>,
    query: QueryPair,
    paths: ProceedPaths,
    options: ScrapeOptions,
}

impl Scraper {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        query: QueryPair,
        paths: ProceedPaths,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            executor,
            query,
            paths,
            options,
        }
    }

    /// Runs until the session settles (or is deferred by the render pass),
    /// publishing every changed view to `sink`.
    pub async fn run(
        &self,
        variables: Variables,
        pass: RenderPass,
        sink: &dyn ViewSink,
    ) -> ScrapeView {
        let state = ScrapeState::new(self.query.clone(), self.paths.clone(), self.options);
        let (mut state, effects) = update(state, Msg::Start { variables, pass });
        publish(&mut state, sink);

        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            let (generation, page, request) = match effect {
                Effect::Execute {
                    generation,
                    page,
                    request,
                } => (generation, page, request),
                // Nothing else is in flight on this task.
                Effect::Cancel { .. } => continue,
            };

            sink.emit(ScrapeEvent::Requested { generation, page });
            let msg = match self.executor.execute(&request).await {
                Ok(response) => Msg::PageLoaded {
                    generation,
                    page,
                    response,
                },
                Err(error) => Msg::PageFailed {
                    generation,
                    page,
                    error,
                },
            };
            let (next, effects) = update(state, msg);
            state = next;
            pending.extend(effects);
            publish(&mut state, sink);
        }

        state.view()
    }

    /// Fetches every page and returns the merged data, or the error that
    /// stopped the session.
    pub async fn collect(&self, variables: Variables) -> Result<AccumulatedResult, ScrapeError> {
        let view = self
            .run(variables, RenderPass::Interactive, &DiscardSink)
            .await;
        match (view.phase, view.error) {
            (Phase::Errored, Some(error)) => Err(error),
            _ => Ok(view.data),
        }
    }
}

fn publish(state: &mut ScrapeState, sink: &dyn ViewSink) {
    if state.consume_dirty() {
        sink.emit(ScrapeEvent::ViewChanged(state.view()));
    }
}
