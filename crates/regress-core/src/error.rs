//! Error taxonomy shared by every engine-regress crate.

use std::time::Duration;
use thiserror::Error;

/// A convenience `Result` alias using [`RegressError`].
pub type RegressResult<T> = Result<T, RegressError>;

/// Top-level error type for the harness.
///
/// Each variant corresponds to a layer that can fail: decoding the engine's
/// XML, the HTTP transport, the session protocol itself, or configuration.
#[derive(Error, Debug)]
pub enum RegressError {
    /// The engine answered with a body that is not well-formed XML.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The request never produced a usable HTTP response.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The engine answered, but not in a way the session protocol allows
    /// (e.g. a session-opening response without an `ident`).
    #[error("Session error: {0}")]
    Session(String),

    /// Project configuration is missing or inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The engine response body could not be decoded into an element tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Encoding(String),

    /// The underlying XML reader rejected the document.
    #[error("malformed XML at byte {position}: {message}")]
    Malformed {
        /// Byte offset reported by the reader.
        position: u64,
        /// Reader diagnostic.
        message: String,
    },

    /// The document contains no element at all.
    #[error("document has no root element")]
    NoRootElement,

    /// The document ended while an element was still open.
    #[error("element <{0}> is never closed")]
    UnclosedElement(String),

    /// Content outside the root element (text, a second root, a stray end tag).
    #[error("unexpected content outside the root element: {0}")]
    UnexpectedContent(String),

    /// An entity reference other than the five predefined XML entities.
    #[error("unknown entity reference &{0};")]
    UnknownEntity(String),
}

/// The HTTP exchange with the engine failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint answered 404; almost always a misconfigured URL.
    #[error("bad endpoint (404): {url}")]
    NotFound {
        /// The URL that was requested.
        url: String,
    },

    /// Any other non-2xx status.
    #[error("HTTP {code} from {url}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// The URL that was requested.
        url: String,
    },

    /// No response within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure and the like.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Status line arrived but the body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// The HTTP status code, when the engine produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Status { code, .. } => Some(*code),
            Self::Timeout(_) | Self::Connection(_) | Self::Body(_) => None,
        }
    }

    /// Whether this failure means "bad endpoint" rather than a generic error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl RegressError {
    /// Shortcut for inspecting a wrapped [`TransportError`].
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}
