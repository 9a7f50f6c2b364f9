use scrape_logging::{scrape_debug, scrape_info, scrape_warn};
use serde_json::Value;

use crate::accumulate::merge;
use crate::{
    Effect, Generation, MergeError, Msg, PageResponse, Pagination, Phase, RenderPass, ScrapeError,
    ScrapeState, TransportError,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ScrapeState, msg: Msg) -> (ScrapeState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start { variables, pass } => {
            let mut effects = Vec::with_capacity(2);
            if let Phase::Fetching { .. } = state.phase() {
                effects.push(Effect::Cancel {
                    generation: state.generation(),
                });
            }

            let generation = state.begin_generation(variables);
            if !state.options().ssr && pass == RenderPass::NonInteractive {
                scrape_debug!(
                    "generation={} deferred: non-interactive pass with ssr disabled",
                    generation
                );
                return (state, effects);
            }

            scrape_info!("generation={} started", generation);
            let request = state.query().first_request(state.variables());
            state.mark_requested(0);
            effects.push(Effect::Execute {
                generation,
                page: 0,
                request,
            });
            effects
        }
        Msg::PageLoaded {
            generation,
            page,
            response,
        } => {
            if !state.is_live(generation, page) {
                log_stale(&state, generation, page);
                return (state, Vec::new());
            }
            apply_page(&mut state, generation, page, &response)
        }
        Msg::PageFailed {
            generation,
            page,
            error,
        } => {
            if !state.is_live(generation, page) {
                log_stale(&state, generation, page);
                return (state, Vec::new());
            }
            fail_transport(&mut state, page, error);
            Vec::new()
        }
        Msg::Detach => {
            let mut effects = Vec::new();
            if let Phase::Fetching { .. } = state.phase() {
                effects.push(Effect::Cancel {
                    generation: state.generation(),
                });
            }
            scrape_debug!("generation={} detached", state.generation());
            state.detach();
            effects
        }
    };

    (state, effects)
}

fn apply_page(
    state: &mut ScrapeState,
    generation: Generation,
    page: usize,
    response: &PageResponse,
) -> Vec<Effect> {
    let designated = state.paths().designated().to_string();
    let count = match response.item_count(&designated) {
        Ok(count) => count,
        Err(err) => {
            fail_shape(state, page, err);
            return Vec::new();
        }
    };

    let merged = match merge(state.data().clone(), response, state.paths()) {
        Ok(merged) => merged,
        Err(err) => {
            fail_shape(state, page, err);
            return Vec::new();
        }
    };
    state.set_data(merged);

    let page_size = state.query().page_size();
    if count < page_size {
        state.complete();
        scrape_info!(
            "generation={} complete after {} page(s), {} item(s) at `{}`",
            generation,
            page + 1,
            state.data().items(&designated).len(),
            designated
        );
        return Vec::new();
    }

    let pagination = state.query().pagination().clone();
    let position = match &pagination {
        Pagination::Offset { .. } => {
            state.advance_offset(count);
            Value::from(state.offset())
        }
        Pagination::Cursor { key, .. } => {
            let cursor = response
                .last_item(&designated)
                .and_then(|item| item.get(key))
                .cloned();
            match cursor {
                Some(cursor) if state.advance_cursor(&cursor) => cursor,
                Some(cursor) => {
                    let err = MergeError::StalledCursor {
                        field: designated,
                        key: key.clone(),
                        cursor: cursor.to_string(),
                    };
                    fail_shape(state, page, err);
                    return Vec::new();
                }
                None => {
                    let err = MergeError::MissingCursor {
                        field: designated,
                        key: key.clone(),
                    };
                    fail_shape(state, page, err);
                    return Vec::new();
                }
            }
        }
    };

    let next = page + 1;
    let request = state.query().next_request(state.variables(), position);
    scrape_debug!(
        "generation={} page={} full ({} item(s)), requesting page {}",
        generation,
        page,
        count,
        next
    );
    state.mark_requested(next);
    vec![Effect::Execute {
        generation,
        page: next,
        request,
    }]
}

fn fail_transport(state: &mut ScrapeState, page: usize, error: TransportError) {
    scrape_warn!(
        "generation={} page={} failed: {}",
        state.generation(),
        page,
        error
    );
    state.fail(ScrapeError::Transport(error));
}

fn fail_shape(state: &mut ScrapeState, page: usize, error: MergeError) {
    scrape_warn!(
        "generation={} page={} rejected: {}",
        state.generation(),
        page,
        error
    );
    state.fail(ScrapeError::MalformedPage(error));
}

fn log_stale(state: &ScrapeState, generation: Generation, page: usize) {
    scrape_debug!(
        "dropping stale response generation={} page={} (live generation={}, phase={:?})",
        generation,
        page,
        state.generation(),
        state.phase()
    );
}
