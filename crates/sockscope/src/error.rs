//! Error types for socket tracking.

use std::io;
use std::path::PathBuf;

/// Result type for socket tracking operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while tracking sockets.
///
/// None of these are retried. A failure anywhere in an aggregation run
/// aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network namespace reference could not be read.
    #[error("cannot read namespace reference '{}': {source}", path.display())]
    NamespaceUnavailable {
        /// The `ns/net` link that was being resolved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The re-entry subprocess could not be run or exited abnormally.
    #[error("re-entry into namespace of pid {pid} failed: {reason}")]
    ExecutionFailed {
        /// Process whose namespace was being entered.
        pid: u32,
        /// What went wrong.
        reason: String,
    },

    /// The re-entry subprocess produced output that does not decode.
    #[error("malformed scan output from namespace of pid {pid}: {source}")]
    MalformedOutput {
        /// Process whose namespace was being scanned.
        pid: u32,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// Listing processes or connections failed.
    #[error("failed to enumerate {what}: {message}")]
    EnumerationFailed {
        /// What was being enumerated (e.g. "processes").
        what: &'static str,
        /// Human-readable error message.
        message: String,
    },

    /// Endpoint text that is not `ip:port`.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an enumeration error from anything printable.
    pub fn enumeration(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::EnumerationFailed {
            what,
            message: err.to_string(),
        }
    }

    /// Check if this error means a process (or its namespace) is gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NamespaceUnavailable { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this is a permission error.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::NamespaceUnavailable { source, .. } => {
                source.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }

    /// Get the process ID this error concerns, if any.
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::ExecutionFailed { pid, .. } | Self::MalformedOutput { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}
