//! Scrape core: proceed-path resolution, page accumulation and the pure
//! controller state machine that decides when paging is done.
mod accumulate;
mod effect;
mod error;
mod msg;
mod paths;
mod query;
mod state;
mod update;
mod view_model;

pub use accumulate::{merge, AccumulatedResult, PageResponse};
pub use effect::Effect;
pub use error::{MergeError, ScrapeError, TransportError, TransportErrorKind, ValidationError};
pub use msg::Msg;
pub use paths::ProceedPaths;
pub use query::{Pagination, QueryPair, QueryRequest, Variables};
pub use state::{Generation, Phase, RenderPass, ScrapeOptions, ScrapeState};
pub use update::update;
pub use view_model::ScrapeView;
