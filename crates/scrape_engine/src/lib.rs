//! Scrape engine: query execution and the runners that drive the core state machine.
mod controller;
mod executor;
mod export;
mod scraper;
mod sink;
mod types;

pub use controller::{ScrapeHandle, EVENT_BACKLOG};
pub use executor::{ExecutorSettings, QueryExecutor, ReqwestExecutor, DEFAULT_ENDPOINT};
pub use export::{ensure_output_dir, write_snapshot, AtomicFileWriter, ExportError};
pub use scraper::Scraper;
pub use sink::{ChannelViewSink, DiscardSink, ViewSink};
pub use types::ScrapeEvent;
