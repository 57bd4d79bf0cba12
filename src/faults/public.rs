//! # Client-safe faults.
//!
//! [`ClientFault`] is the only fault shape that crosses the service boundary.
//! Pass-through and wrapped-client faults keep their code and message; every other
//! kind is reduced to a stable [`ErrorCode`] plus its generic description, so internal
//! detail (cause chains, store messages, panic payloads) stays in local logs.
//!
//! ```text
//! Visibility::Verbatim     PassThrough / Client     ─► { code, message }
//! Visibility::UnwrapCause  AccessDenied { cause }   ─► cause if client-facing, else ACCESS_DENIED
//! Visibility::Translated   Command { code, msg }    ─► { code, msg }   (cause dropped)
//! Visibility::Generic      Storage / Corrupted      ─► STORAGE_FAILURE
//!                          Unclassified             ─► INTERNAL
//! Visibility::LoggedOnly   Unsupported              ─► UNSUPPORTED
//!                          Assertion                ─► INTERNAL
//! ```

use thiserror::Error;

use crate::faults::fault::{ErrorCode, Fault};
use crate::faults::kind::{FaultKind, Visibility};

/// Normalized fault returned to remote callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ClientFault {
    /// Stable client-facing code.
    pub code: ErrorCode,
    /// Human-readable description safe to serialize.
    pub message: String,
    /// Kind the original fault was classified as.
    pub kind: FaultKind,
}

impl ClientFault {
    /// Creates a client fault.
    pub fn new(code: ErrorCode, message: impl Into<String>, kind: FaultKind) -> Self {
        Self {
            code,
            message: message.into(),
            kind,
        }
    }

    /// Generic fault carrying only `code` and its generic description.
    pub fn generic(code: ErrorCode, kind: FaultKind) -> Self {
        Self::new(code, code.generic_message(), kind)
    }

    /// Returned when the service no longer accepts work (closing or exiting).
    pub fn unavailable() -> Self {
        Self::generic(ErrorCode::Unavailable, FaultKind::WrappedClientFault)
    }

    /// Normalizes `fault`, already classified as `kind`, for the remote caller.
    ///
    /// The presentation follows [`FaultKind::visibility`].
    pub fn from_fault(fault: Fault, kind: FaultKind) -> Self {
        match kind.visibility() {
            Visibility::Verbatim | Visibility::Translated => match unwrap_other(fault) {
                Fault::PassThrough { code, message, .. }
                | Fault::Client { code, message }
                | Fault::Command { code, message, .. } => Self::new(code, message, kind),
                _ => Self::generic(stable_code(kind), kind),
            },
            Visibility::UnwrapCause => match unwrap_other(fault) {
                Fault::AccessDenied { cause } => match unwrap_other(*cause) {
                    Fault::Client { code, message } | Fault::PassThrough { code, message, .. } => {
                        Self::new(code, message, kind)
                    }
                    _ => Self::generic(ErrorCode::AccessDenied, kind),
                },
                _ => Self::generic(ErrorCode::AccessDenied, kind),
            },
            Visibility::Generic | Visibility::LoggedOnly => Self::generic(stable_code(kind), kind),
        }
    }
}

/// Code reported for kinds whose detail never leaves the process.
fn stable_code(kind: FaultKind) -> ErrorCode {
    match kind {
        FaultKind::StorageFault | FaultKind::EnvironmentCorrupted => ErrorCode::StorageFailure,
        FaultKind::UnsupportedOperation => ErrorCode::Unsupported,
        FaultKind::ClientAccessDenied => ErrorCode::AccessDenied,
        _ => ErrorCode::Internal,
    }
}

/// Looks through opaque wrappers that carry a [`Fault`].
fn unwrap_other(fault: Fault) -> Fault {
    match fault {
        Fault::Other(err) => match err.downcast::<Fault>() {
            Ok(inner) => unwrap_other(inner),
            Err(err) => Fault::Other(err),
        },
        fault => fault,
    }
}
