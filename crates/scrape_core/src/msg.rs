use crate::{Generation, PageResponse, RenderPass, TransportError, Variables};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Caller (re)started the scrape; always opens a fresh generation.
    Start {
        variables: Variables,
        pass: RenderPass,
    },
    /// Executor returned a page for the given generation.
    PageLoaded {
        generation: Generation,
        page: usize,
        response: PageResponse,
    },
    /// Executor failed for the given generation.
    PageFailed {
        generation: Generation,
        page: usize,
        error: TransportError,
    },
    /// Consumer went away; anything still in flight becomes stale.
    Detach,
}
