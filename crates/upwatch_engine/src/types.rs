use std::fmt;

use upwatch_core::FormatError;

/// Largest number of embeds a chat webhook message may carry.
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch failed ({kind}): {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// The listing no longer has the shape the parser expects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("listing table `{selector}` not found")]
    TableNotFound { selector: &'static str },
    #[error("selector `{selector}` does not compile: {reason}")]
    InvalidSelector {
        selector: &'static str,
        reason: String,
    },
    #[error("row {row}: missing column {column}")]
    MissingColumn { row: usize, column: usize },
    #[error("row {row}: file id column has no link")]
    MissingLink { row: usize },
    #[error("row {row}: field `{field}` is empty")]
    EmptyField { row: usize, field: &'static str },
    #[error("row {row}: bad timestamp")]
    Timestamp {
        row: usize,
        #[source]
        source: FormatError,
    },
}

/// Why one source page produced no trustworthy result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("page layout changed: {0}")]
    Parse(#[from] ParseError),
    #[error("timestamp format changed: {0}")]
    Format(#[from] FormatError),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{count} records do not fit in one webhook message (limit {limit})")]
pub struct ChannelOverflowError {
    pub count: usize,
    pub limit: usize,
}

/// Errors that end a whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cache directory unusable: {0}")]
    CacheDir(#[from] crate::CacheError),
    #[error("fetcher setup failed: {0}")]
    FetcherSetup(FetchError),
    #[error("notifier setup failed: {0}")]
    NotifierSetup(DispatchError),
    #[error(transparent)]
    ChannelOverflow(#[from] ChannelOverflowError),
}
