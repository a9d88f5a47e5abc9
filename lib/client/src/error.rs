//! Error types for the client crate.
//!
//! - `TransportError`: a request could not be completed at all
//! - `ApiError`: a chained helper got a response it cannot continue from

use std::fmt;

/// Errors from executing a single HTTP call.
///
/// The status code of a completed call is never an error at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be built (bad URL, unserializable body).
    InvalidRequest { reason: String },
    /// Connecting or sending failed.
    ConnectionFailed { url: String, reason: String },
    /// The request did not finish within its timeout.
    Timeout { url: String },
    /// Reading the response body failed.
    BodyRead { url: String, reason: String },
    /// Writing a downloaded body to disk failed.
    LocalFile { path: String, reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { reason } => {
                write!(f, "invalid request: {reason}")
            }
            Self::ConnectionFailed { url, reason } => {
                write!(f, "http request to {url} failed: {reason}")
            }
            Self::Timeout { url } => write!(f, "http request to {url} timed out"),
            Self::BodyRead { url, reason } => {
                write!(f, "reading response body from {url} failed: {reason}")
            }
            Self::LocalFile { path, reason } => {
                write!(f, "writing {path} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors from helpers that must interpret the response they receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The call itself failed.
    Transport(TransportError),
    /// The server answered with a non-2xx status.
    UnexpectedStatus { status: u16, body: String },
    /// The body did not have the expected shape.
    UnexpectedResponse { reason: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::UnexpectedStatus { status, body } => {
                write!(f, "unexpected response: status={status} body={body}")
            }
            Self::UnexpectedResponse { reason } => {
                write!(f, "unexpected response: {reason}")
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
