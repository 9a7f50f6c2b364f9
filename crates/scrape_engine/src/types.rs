use scrape_core::{Generation, ScrapeView};

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    /// A page request was handed to the executor.
    Requested { generation: Generation, page: usize },
    /// The caller-visible view changed.
    ViewChanged(ScrapeView),
}
