//! # Fault values raised by administrative operations.
//!
//! [`Fault`] is a single tagged union with an ordinary cause chain. Each variant
//! corresponds to one row of the classification table in
//! [`FaultClassifier`](crate::FaultClassifier); the variant, not a type hierarchy,
//! decides how the fault is handled.
//!
//! ## Cause chains
//! ```text
//! AccessDenied { cause } ──► cause crosses the boundary (wrapper dropped)
//! Command { cause }      ──► cause decides fatality (looked through recursively)
//! Other(anyhow::Error)   ──► downcast to Fault when possible, otherwise Unclassified
//! ```
//!
//! ## Example
//! ```rust
//! use adminvisor::{ErrorCode, Fault};
//!
//! let f = Fault::command(ErrorCode::IllegalCommand, "unknown table users")
//!     .with_cause(Fault::storage("lock timeout"));
//! assert_eq!(f.as_label(), "command_fault");
//! ```

use std::fmt;

use thiserror::Error;

/// Stable, client-facing error codes.
///
/// The string form ([`ErrorCode::as_str`]) is what remote callers match on; it never
/// changes between releases.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The statement or command is malformed or refers to unknown objects.
    IllegalCommand,
    /// The referenced plan or object does not exist.
    NotFound,
    /// The requested plan transition is not legal from the current state.
    IllegalState,
    /// A plan failed while executing.
    PlanFailure,
    /// The caller is not allowed to perform the operation.
    AccessDenied,
    /// The persistent store failed.
    StorageFailure,
    /// The operation is not valid for the current configuration.
    Unsupported,
    /// Internal failure; details are only logged locally.
    Internal,
    /// The service is shutting down or restarting.
    Unavailable,
}

impl ErrorCode {
    /// Returns the stable wire string for this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IllegalCommand => "ILLEGAL_COMMAND",
            Self::NotFound => "NOT_FOUND",
            Self::IllegalState => "ILLEGAL_STATE",
            Self::PlanFailure => "PLAN_FAILURE",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::Unsupported => "UNSUPPORTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
        }
    }

    /// Returns the generic description used when internal detail must not leak.
    pub const fn generic_message(self) -> &'static str {
        match self {
            Self::IllegalCommand => "illegal command",
            Self::NotFound => "resource not found",
            Self::IllegalState => "operation not allowed in current state",
            Self::PlanFailure => "plan execution failed",
            Self::AccessDenied => "access denied",
            Self::StorageFailure => "storage failure",
            Self::Unsupported => "operation not supported",
            Self::Internal => "internal error",
            Self::Unavailable => "service unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Abnormal outcome of an administrative operation.
///
/// Created by the failing operation and consumed exactly once by the
/// [`OperationExecutor`](crate::OperationExecutor).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Fault {
    /// Originated in another internal service that already classified and logged it.
    #[error("{service}: {message}")]
    PassThrough {
        /// Name of the originating service.
        service: String,
        /// Code assigned by the originating service.
        code: ErrorCode,
        /// Message assigned by the originating service.
        message: String,
    },

    /// Authorization failure for the caller; the cause is what the caller sees.
    #[error("access denied: {cause}")]
    AccessDenied {
        /// The fault describing the denial.
        cause: Box<Fault>,
    },

    /// A fault the caller is meant to see verbatim.
    #[error("{message}")]
    Client {
        /// Client-facing code.
        code: ErrorCode,
        /// Client-facing message.
        message: String,
    },

    /// Command-level fault with a typed code and an optional cause.
    #[error("{code}: {message}")]
    Command {
        /// Client-facing code.
        code: ErrorCode,
        /// Client-facing message.
        message: String,
        /// Underlying fault; decides whether the process must exit.
        #[source]
        cause: Option<Box<Fault>>,
    },

    /// Persistent store failure.
    #[error("storage failure: {message}")]
    Storage {
        /// Store-specific detail (logged only).
        message: String,
    },

    /// Invariant violation judged recoverable.
    #[error("assertion failed: {message}")]
    Assertion {
        /// Description of the violated invariant.
        message: String,
    },

    /// Operation invalid for the current configuration.
    #[error("unsupported operation: {message}")]
    Unsupported {
        /// Description of the rejected operation.
        message: String,
    },

    /// The underlying storage reports unrecoverable corruption.
    #[error("environment corrupted: {message}")]
    EnvironmentCorrupted {
        /// Store-specific detail (logged only).
        message: String,
    },

    /// Unrecoverable runtime defect (for example a panic caught by the executor).
    #[error("runtime defect: {message}")]
    Defect {
        /// Defect description.
        message: String,
    },

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Fault {
    /// Creates a [`Fault::Client`] fault.
    pub fn client(code: ErrorCode, message: impl Into<String>) -> Self {
        Fault::Client {
            code,
            message: message.into(),
        }
    }

    /// Creates a [`Fault::Command`] fault without a cause.
    pub fn command(code: ErrorCode, message: impl Into<String>) -> Self {
        Fault::Command {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a [`Fault::PassThrough`] fault.
    pub fn pass_through(
        service: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Fault::PassThrough {
            service: service.into(),
            code,
            message: message.into(),
        }
    }

    /// Wraps `cause` into a [`Fault::AccessDenied`].
    pub fn access_denied(cause: Fault) -> Self {
        Fault::AccessDenied {
            cause: Box::new(cause),
        }
    }

    /// Creates a [`Fault::Storage`] fault.
    pub fn storage(message: impl Into<String>) -> Self {
        Fault::Storage {
            message: message.into(),
        }
    }

    /// Creates a [`Fault::Assertion`] fault.
    pub fn assertion(message: impl Into<String>) -> Self {
        Fault::Assertion {
            message: message.into(),
        }
    }

    /// Creates a [`Fault::Unsupported`] fault.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Fault::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a [`Fault::EnvironmentCorrupted`] fault.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Fault::EnvironmentCorrupted {
            message: message.into(),
        }
    }

    /// Creates a [`Fault::Defect`] fault.
    pub fn defect(message: impl Into<String>) -> Self {
        Fault::Defect {
            message: message.into(),
        }
    }

    /// Attaches a cause to a [`Fault::Command`]; other variants are returned unchanged.
    pub fn with_cause(self, cause: Fault) -> Self {
        match self {
            Fault::Command { code, message, .. } => Fault::Command {
                code,
                message,
                cause: Some(Box::new(cause)),
            },
            other => other,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Fault::PassThrough { .. } => "pass_through",
            Fault::AccessDenied { .. } => "access_denied",
            Fault::Client { .. } => "client_fault",
            Fault::Command { .. } => "command_fault",
            Fault::Storage { .. } => "storage_fault",
            Fault::Assertion { .. } => "assertion_failure",
            Fault::Unsupported { .. } => "unsupported_operation",
            Fault::EnvironmentCorrupted { .. } => "environment_corrupted",
            Fault::Defect { .. } => "runtime_defect",
            Fault::Other(_) => "unclassified",
        }
    }
}
