use std::fmt;

/// Caller-side configuration mistakes, reported before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least one proceed path is required")]
    NoProceedPaths,
    #[error("proceed path `{0}` is listed more than once")]
    DuplicateProceedPath(String),
    #[error("proceed path at index {index} is blank")]
    BlankProceedPath { index: usize },
    #[error("page size must be greater than zero")]
    ZeroPageSize,
    #[error("the {which} query document is blank")]
    BlankDocument { which: &'static str },
}

/// A page whose shape does not fit the configured proceed paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("field `{field}` should be a list but was {found}")]
    NotAList { field: String, found: &'static str },
    #[error("field `{field}` is missing from the page")]
    MissingField { field: String },
    #[error("last item of `{field}` has no `{key}` to continue from")]
    MissingCursor { field: String, key: String },
    #[error("cursor `{key}` of `{field}` did not advance past {cursor}")]
    StalledCursor {
        field: String,
        key: String,
        cursor: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    InvalidEndpoint,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    GraphQl,
    Network,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            TransportErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            TransportErrorKind::Decode => write!(f, "malformed response"),
            TransportErrorKind::GraphQl => write!(f, "query returned errors"),
            TransportErrorKind::Network => write!(f, "network error"),
        }
    }
}

/// Why a session ended in the errored phase. Surfaced through the view,
/// never returned across the consumer boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed page: {0}")]
    MalformedPage(#[from] MergeError),
}
