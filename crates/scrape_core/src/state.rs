use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::view_model::ScrapeView;
use crate::{AccumulatedResult, ProceedPaths, QueryPair, ScrapeError, Variables};

/// Monotonic session tag; responses carrying an older value are stale.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Fetching {
        page: usize,
    },
    Complete,
    Errored,
}

/// Whether the current invocation may talk to the network at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPass {
    #[default]
    Interactive,
    /// Server-side style pre-render; suppressed when `ssr` is off.
    NonInteractive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeOptions {
    pub ssr: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self { ssr: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeState {
    query: QueryPair,
    paths: ProceedPaths,
    options: ScrapeOptions,
    generation: Generation,
    phase: Phase,
    variables: Variables,
    data: AccumulatedResult,
    loading: bool,
    error: Option<ScrapeError>,
    requests: usize,
    offset: usize,
    cursor: Option<Value>,
    dirty: bool,
}

impl ScrapeState {
    pub fn new(query: QueryPair, paths: ProceedPaths, options: ScrapeOptions) -> Self {
        Self {
            query,
            paths,
            options,
            generation: 0,
            phase: Phase::Idle,
            variables: Variables::new(),
            data: AccumulatedResult::new(),
            loading: false,
            error: None,
            requests: 0,
            offset: 0,
            cursor: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> ScrapeView {
        ScrapeView {
            generation: self.generation,
            phase: self.phase,
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            requests: self.requests,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn data(&self) -> &AccumulatedResult {
        &self.data
    }

    pub fn query(&self) -> &QueryPair {
        &self.query
    }

    pub fn paths(&self) -> &ProceedPaths {
        &self.paths
    }

    pub fn options(&self) -> ScrapeOptions {
        self.options
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn variables(&self) -> &Variables {
        &self.variables
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn is_live(&self, generation: Generation, page: usize) -> bool {
        generation == self.generation && self.phase == Phase::Fetching { page }
    }

    pub(crate) fn begin_generation(&mut self, variables: Variables) -> Generation {
        self.generation += 1;
        self.phase = Phase::Idle;
        self.variables = variables;
        self.data = AccumulatedResult::new();
        self.loading = true;
        self.error = None;
        self.requests = 0;
        self.offset = 0;
        self.cursor = None;
        self.dirty = true;
        self.generation
    }

    pub(crate) fn detach(&mut self) {
        self.generation += 1;
        self.phase = Phase::Idle;
        self.loading = false;
        self.dirty = true;
    }

    pub(crate) fn mark_requested(&mut self, page: usize) {
        self.phase = Phase::Fetching { page };
        self.requests += 1;
        self.dirty = true;
    }

    pub(crate) fn set_data(&mut self, data: AccumulatedResult) {
        self.data = data;
        self.dirty = true;
    }

    pub(crate) fn advance_offset(&mut self, count: usize) {
        self.offset += count;
    }

    /// Records the cursor for the next page. Returns `false` when it repeats
    /// the previous one, which would refetch the same page forever.
    pub(crate) fn advance_cursor(&mut self, cursor: &Value) -> bool {
        if self.cursor.as_ref() == Some(cursor) {
            return false;
        }
        self.cursor = Some(cursor.clone());
        true
    }

    pub(crate) fn complete(&mut self) {
        self.phase = Phase::Complete;
        self.loading = false;
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, error: ScrapeError) {
        self.phase = Phase::Errored;
        self.loading = false;
        self.error = Some(error);
        self.dirty = true;
    }
}
