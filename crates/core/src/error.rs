//! Error types for txinflow
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Retry contract
//!
//! Only [`Error::RetryableRecovery`] is transient. Callers that get it from a
//! lookup should retry the whole lookup later; it never means "not found".

use crate::types::Xid;
use std::io;
use thiserror::Error;

/// Result type alias for txinflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the import registry and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// A required identifier was null, or a recovered record could not be
    /// resolved to a global transaction
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A recovered transaction could not reconcile its base identifier yet
    #[error("Recovery incomplete for {xid}, retry later")]
    RetryableRecovery {
        /// The identifier the lookup was issued for
        xid: Xid,
    },

    /// Failure raised by a construction or reconstruction collaborator
    #[error("Collaborator failure: {0}")]
    CollaboratorFailure(String),

    /// Illegal status transition on a subordinate transaction
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// Status the transaction was in
        from: String,
        /// Status that was requested
        to: String,
    },

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config file reads)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Shorthand for [`Error::CollaboratorFailure`]
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Error::CollaboratorFailure(msg.into())
    }

    /// Whether the caller should retry the failed operation later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RetryableRecovery { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_argument() {
        let err = Error::invalid_argument("xid is null");
        let msg = err.to_string();
        assert!(msg.contains("Invalid argument"));
        assert!(msg.contains("xid is null"));
    }

    #[test]
    fn test_error_display_retryable() {
        let xid = Xid::new(1, b"gtrid", b"bq").unwrap();
        let err = Error::RetryableRecovery { xid: xid.clone() };
        let msg = err.to_string();
        assert!(msg.contains("retry later"));
        assert!(msg.contains(&xid.to_string()));
    }

    #[test]
    fn test_error_display_invalid_state() {
        let err = Error::InvalidState {
            from: "Committed".to_string(),
            to: "Prepared".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Committed"));
        assert!(msg.contains("Prepared"));
    }

    #[test]
    fn test_only_retryable_recovery_is_retryable() {
        let xid = Xid::new(1, b"gtrid", b"").unwrap();
        assert!(Error::RetryableRecovery { xid }.is_retryable());
        assert!(!Error::invalid_argument("x").is_retryable());
        assert!(!Error::collaborator("x").is_retryable());
        assert!(!Error::Config("x".into()).is_retryable());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
