use serde::Serialize;

use crate::{AccumulatedResult, Generation, Phase, ScrapeError};

/// Snapshot handed to consumers after every observable change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScrapeView {
    pub generation: Generation,
    pub phase: Phase,
    pub data: AccumulatedResult,
    pub loading: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ScrapeError>,
    pub requests: usize,
}

impl ScrapeView {
    /// True once the generation has completed or errored.
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, Phase::Complete | Phase::Errored)
    }
}

fn serialize_error<S>(error: &Option<ScrapeError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
