//! Error types for stackd
//!
//! Central error taxonomy shared by every layer.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// stackd error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Request validation
    // ========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    // ========================================================================
    // Operation execution
    // ========================================================================
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Runner error: {0}")]
    Runner(String),

    /// The stack runner reported that nothing is currently running.
    /// Teardown treats this as success so stop/destroy stay idempotent.
    #[error("stack is not running")]
    NotRunning,

    /// A panic inside a captured operation, converted after the output
    /// snapshot was taken.
    #[error("Operation fault: {0}")]
    Fault(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check whether this error is the "nothing to stop" condition.
    ///
    /// Matches both the typed variant and a runner that only surfaces the
    /// condition as message text.
    pub fn is_not_running(&self) -> bool {
        match self {
            Error::NotRunning => true,
            Error::Runner(message) => message == "stack is not running",
            _ => false,
        }
    }

    /// Prefix a runner failure with an operation-identifying message.
    ///
    /// Other variants pass through untouched so the taxonomy (environment,
    /// fault, timeout) survives wrapping.
    pub fn with_operation(self, operation: &str) -> Self {
        match self {
            Error::Runner(message) => Error::Runner(format!("{operation}: {message}")),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_running_matches_typed_variant() {
        assert!(Error::NotRunning.is_not_running());
    }

    #[test]
    fn not_running_matches_message_text() {
        assert!(Error::Runner("stack is not running".into()).is_not_running());
        assert!(!Error::Runner("stack exploded".into()).is_not_running());
    }

    #[test]
    fn with_operation_prefixes_runner_errors() {
        let err = Error::Runner("oom".into()).with_operation("stack start failed");
        assert_eq!(err.to_string(), "Runner error: stack start failed: oom");
    }

    #[test]
    fn with_operation_leaves_other_variants_alone() {
        let err = Error::Environment("bad root".into()).with_operation("stack start failed");
        assert!(matches!(err, Error::Environment(_)));
    }
}
