//! Errors surfaced by the runner binary.

use std::fmt;

#[derive(Debug)]
pub enum RunnerError {
    /// Environment configuration is missing or malformed.
    Configuration { details: String },
    /// Command-line usage error.
    Usage { details: String },
    /// The params document is not a JSON object.
    InvalidParams { details: String },
    /// Registering the configured connection failed.
    ConnectFailed { details: String },
    /// The connector rejected the operation before running it.
    OperationRejected { operation: String, details: String },
    /// The result could not be written out.
    Output { details: String },
    /// Ctrl-C arrived before the operation finished.
    Interrupted,
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "configuration error: {}", details),
            Self::Usage { details } => write!(f, "usage: {}", details),
            Self::InvalidParams { details } => write!(f, "invalid params: {}", details),
            Self::ConnectFailed { details } => write!(f, "connect failed: {}", details),
            Self::OperationRejected { operation, details } => {
                write!(f, "operation '{}' rejected: {}", operation, details)
            }
            Self::Output { details } => write!(f, "failed to write result: {}", details),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for RunnerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_operation() {
        let err = RunnerError::OperationRejected {
            operation: "drop_base".to_string(),
            details: "operation not supported: drop_base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'drop_base' rejected: operation not supported: drop_base"
        );
    }
}
