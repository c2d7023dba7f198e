//! Error types for the wire client and the Ollama API layer.
//!
//! # Design
//! `WireError` covers everything that can go wrong between resolving a host
//! and parsing the reply. It is never retried here; callers decide. `kind()`
//! flattens it into a `Copy` tag for callers that only need to branch.
//!
//! `ApiError` wraps `WireError` for the Ollama layer and adds the failures
//! that only make sense once a body is expected to hold JSON.

use std::io;

/// Coarse classification of a [`WireError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Connection,
    Write,
    Read,
    ConnectionClosed,
    Malformed,
    TooLarge,
}

/// Failures of a single request/response exchange.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Name lookup failed or produced no addresses.
    #[error("failed to resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    /// Every candidate address refused or failed the connect.
    #[error("failed to connect to {endpoint} ({attempts} address(es) tried): {source}")]
    Connection {
        endpoint: String,
        attempts: usize,
        #[source]
        source: io::Error,
    },

    /// The request could not be written in full.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Reading the reply failed with something other than a timeout.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// Nothing was received before the peer closed or the read timed out.
    #[error("connection closed before any response was received")]
    ConnectionClosed,

    /// The reply did not contain a usable status line or header block.
    #[error("malformed response: {0}")]
    Malformed(&'static str),

    /// The reply grew past the configured limit.
    #[error("response exceeded {limit} bytes")]
    TooLarge { limit: usize },
}

impl WireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WireError::Resolution { .. } => ErrorKind::Resolution,
            WireError::Connection { .. } => ErrorKind::Connection,
            WireError::Write(_) => ErrorKind::Write,
            WireError::Read(_) => ErrorKind::Read,
            WireError::ConnectionClosed => ErrorKind::ConnectionClosed,
            WireError::Malformed(_) => ErrorKind::Malformed,
            WireError::TooLarge { .. } => ErrorKind::TooLarge,
        }
    }
}

/// Errors returned by the Ollama API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable HTTP response was obtained.
    #[error("no response from server: {0}")]
    Transport(#[from] WireError),

    /// The server answered with a JSON `error` field.
    #[error("server returned error (HTTP {status}): {message}")]
    Server { status: i32, message: String },

    /// A non-2xx status without a recognizable error payload.
    #[error("HTTP {status}: {body}")]
    HttpError { status: i32, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The server URL cannot be used by a plaintext client.
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}
