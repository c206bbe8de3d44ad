//! Agent engine boundary.
//!
//! The engine is an opaque, stateful collaborator addressed by a session
//! key. The client's entire view of it is [`AgentEngine::open_stream`]:
//! feed it an input, consume snapshots until the engine finishes the turn
//! or pauses for review.

use std::fmt;
use std::future::Future;

use anyhow::Result;
use futures_util::stream::BoxStream;
use hail_types::{SessionId, Snapshot, TurnInput};

mod remote;
mod sse;

pub use remote::{RemoteEngine, RemoteEngineConfig};
pub use sse::SnapshotSseParser;

/// Boxed stream of snapshots from one open turn stream.
pub type SnapshotStream = BoxStream<'static, EngineResult<Snapshot>>;

/// Result type for engine stream items.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// An opaque agent execution engine.
///
/// `open_stream` starts or resumes execution for `session` and returns a
/// lazy, ordered, finite snapshot sequence. The sequence ends when the
/// engine finishes or pauses; it is consumed fully or dropped, never
/// restarted mid-way. The session key must be routed byte-for-byte for the
/// engine to locate paused state on resume.
pub trait AgentEngine {
    fn open_stream(
        &self,
        session: &SessionId,
        input: TurnInput,
    ) -> impl Future<Output = Result<SnapshotStream>> + Send;
}

/// Categories of engine errors for consistent error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection or request timeout
    Timeout,
    /// Failed to parse a stream event or snapshot
    Parse,
    /// Error event surfaced by the engine mid-stream
    ApiError,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErrorKind::HttpStatus => write!(f, "http_status"),
            EngineErrorKind::Timeout => write!(f, "timeout"),
            EngineErrorKind::Parse => write!(f, "parse"),
            EngineErrorKind::ApiError => write!(f, "api_error"),
        }
    }
}

/// Structured error from the engine boundary with kind and details.
#[derive(Debug, Clone)]
pub struct EngineError {
    /// Error category
    pub kind: EngineErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: EngineErrorKind::HttpStatus,
            message: format!("HTTP {status}"),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Timeout, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Parse, message)
    }

    /// Creates an error from a mid-stream engine error event.
    pub fn api_error(error_type: &str, message: &str) -> Self {
        Self {
            kind: EngineErrorKind::ApiError,
            message: format!("{error_type}: {message}"),
            details: None,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EngineError {}
