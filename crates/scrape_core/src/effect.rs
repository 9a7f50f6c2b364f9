use crate::{Generation, QueryRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Execute {
        generation: Generation,
        page: usize,
        request: QueryRequest,
    },
    /// The generation was superseded while a request was in flight. Runners
    /// may abort it; its response would be discarded either way.
    Cancel { generation: Generation },
}
