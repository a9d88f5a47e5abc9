//! Error types for the nodes crate.
//!
//! Pass-through nodes report non-2xx responses as normal output. Only
//! chained flows (upload, download, auto-link) turn a bad status into
//! `NodeError::Remote`.

use seatable_client::{ApiError, TransportError};
use std::fmt;

/// Errors from running a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A required input is missing or malformed, or the client ID is unknown.
    InvalidArgument { reason: String },
    /// The connector has no operation with this name.
    OperationNotSupported { operation: String },
    /// An HTTP call could not be completed.
    Transport(TransportError),
    /// A chained call answered with a non-2xx status.
    Remote {
        operation: String,
        status: u16,
        body: String,
    },
    /// A response did not have the shape the next step needs.
    Protocol { reason: String },
    /// Local file access failed.
    Io { path: String, reason: String },
}

impl NodeError {
    /// Creates an invalid-argument error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Converts a helper error, naming the step that failed.
    pub fn from_api(operation: &str, err: ApiError) -> Self {
        match err {
            ApiError::Transport(err) => Self::Transport(err),
            ApiError::UnexpectedStatus { status, body } => Self::Remote {
                operation: operation.to_string(),
                status,
                body,
            },
            ApiError::UnexpectedResponse { reason } => Self::Protocol {
                reason: format!("{operation}: {reason}"),
            },
        }
    }

    /// Returns true for errors caused by the caller's input.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::OperationNotSupported { .. }
        )
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::OperationNotSupported { operation } => {
                write!(f, "operation not supported: {operation}")
            }
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Remote {
                operation,
                status,
                body,
            } => {
                write!(f, "{operation} failed: status={status} body={body}")
            }
            Self::Protocol { reason } => write!(f, "protocol error: {reason}"),
            Self::Io { path, reason } => write!(f, "file error for {path}: {reason}"),
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for NodeError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
