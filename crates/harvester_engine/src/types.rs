use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use harvester_core::{Identifier, RunSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    ClientSetup,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl FailureKind {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FailureKind::HttpStatus(404))
    }

    /// Failures another attempt may fix: timeouts, connection errors and
    /// non-success statuses other than 404.
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::HttpStatus(code) => *code != 404,
            FailureKind::InvalidUrl | FailureKind::ClientSetup | FailureKind::TooLarge { .. } => {
                false
            }
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::ClientSetup => write!(f, "http client setup failed"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Structured per-identifier events, delivered through a [`crate::HarvestSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    Skipped {
        id: Identifier,
    },
    Fetching {
        id: Identifier,
        position: usize,
        total: usize,
    },
    Retrying {
        id: Identifier,
        attempt: u32,
        max_attempts: u32,
        cause: FetchError,
        delay: Duration,
    },
    /// The page was served from a different URL than requested.
    Redirected {
        id: Identifier,
        to: String,
    },
    NotFound {
        id: Identifier,
    },
    FetchFailed {
        id: Identifier,
        attempts: u32,
        cause: String,
    },
    Extracted {
        id: Identifier,
        strategy: &'static str,
        body_chars: usize,
    },
    ExtractionFailed {
        id: Identifier,
        reason: String,
    },
    Duplicate {
        id: Identifier,
    },
    Checkpoint {
        records: usize,
        path: PathBuf,
    },
    Finished {
        summary: RunSummary,
        records: usize,
        path: PathBuf,
    },
}
