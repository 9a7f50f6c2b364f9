use std::sync::mpsc::{self, TrySendError};

use scrape_logging::scrape_trace;

use crate::ScrapeEvent;

pub trait ViewSink: Send + Sync {
    fn emit(&self, event: ScrapeEvent);
}

/// Forwards events into a bounded channel. When the receiver falls behind,
/// new events are dropped rather than queued.
pub struct ChannelViewSink {
    tx: mpsc::SyncSender<ScrapeEvent>,
}

impl ChannelViewSink {
    pub fn new(tx: mpsc::SyncSender<ScrapeEvent>) -> Self {
        Self { tx }
    }
}

impl ViewSink for ChannelViewSink {
    fn emit(&self, event: ScrapeEvent) {
        match self.tx.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => scrape_trace!("event backlog full; dropping event"),
        }
    }
}

/// Drops every event; for callers that only want the settled result.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl ViewSink for DiscardSink {
    fn emit(&self, _event: ScrapeEvent) {}
}
