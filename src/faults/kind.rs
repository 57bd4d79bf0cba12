//! # Normalized fault kinds.
//!
//! | kind                 | client-visible?             | fatal?              |
//! |----------------------|-----------------------------|---------------------|
//! | InternalPassThrough  | yes (unwrapped)             | no                  |
//! | ClientAccessDenied   | yes (inner cause)           | no                  |
//! | WrappedClientFault   | yes (unwrapped)             | no                  |
//! | CommandFault         | yes (translated)            | depends on cause    |
//! | StorageFault         | yes (generic code)          | no                  |
//! | AssertionFailure     | logged only                 | no                  |
//! | UnsupportedOperation | logged only                 | no                  |
//! | EnvironmentCorrupted | logged + generic code       | yes, no restart     |
//! | Unclassified         | logged + generic code       | yes, restart        |

use std::fmt;

/// Normalized classification of a [`Fault`](crate::Fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Already classified and logged by another internal service.
    InternalPassThrough,
    /// Authorization failure for the caller.
    ClientAccessDenied,
    /// Fault meant for the caller verbatim.
    WrappedClientFault,
    /// Command-level fault; fatality is decided by its cause.
    CommandFault,
    /// Persistent store failure.
    StorageFault,
    /// Recoverable invariant violation.
    AssertionFailure,
    /// Operation invalid for the current configuration.
    UnsupportedOperation,
    /// Unrecoverable storage corruption.
    EnvironmentCorrupted,
    /// Anything else.
    Unclassified,
}

/// How a fault of a given kind crosses the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Returned to the caller unchanged.
    Verbatim,
    /// The wrapper is dropped and its cause is returned.
    UnwrapCause,
    /// Translated to its code and message, cause chain dropped.
    Translated,
    /// Replaced by a generic fault carrying a stable code.
    Generic,
    /// Logged locally; the caller only sees a generic fault.
    LoggedOnly,
}

impl FaultKind {
    /// All kinds, in table order.
    pub const ALL: [FaultKind; 9] = [
        FaultKind::InternalPassThrough,
        FaultKind::ClientAccessDenied,
        FaultKind::WrappedClientFault,
        FaultKind::CommandFault,
        FaultKind::StorageFault,
        FaultKind::AssertionFailure,
        FaultKind::UnsupportedOperation,
        FaultKind::EnvironmentCorrupted,
        FaultKind::Unclassified,
    ];

    /// Returns how faults of this kind are presented to remote callers.
    pub const fn visibility(self) -> Visibility {
        match self {
            FaultKind::InternalPassThrough | FaultKind::WrappedClientFault => Visibility::Verbatim,
            FaultKind::ClientAccessDenied => Visibility::UnwrapCause,
            FaultKind::CommandFault => Visibility::Translated,
            FaultKind::StorageFault
            | FaultKind::EnvironmentCorrupted
            | FaultKind::Unclassified => Visibility::Generic,
            FaultKind::AssertionFailure | FaultKind::UnsupportedOperation => {
                Visibility::LoggedOnly
            }
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub const fn as_label(self) -> &'static str {
        match self {
            FaultKind::InternalPassThrough => "internal_pass_through",
            FaultKind::ClientAccessDenied => "client_access_denied",
            FaultKind::WrappedClientFault => "wrapped_client_fault",
            FaultKind::CommandFault => "command_fault",
            FaultKind::StorageFault => "storage_fault",
            FaultKind::AssertionFailure => "assertion_failure",
            FaultKind::UnsupportedOperation => "unsupported_operation",
            FaultKind::EnvironmentCorrupted => "environment_corrupted",
            FaultKind::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Result of [`FaultClassifier::classify`](crate::FaultClassifier::classify).
///
/// `cause` is only set for [`FaultKind::CommandFault`]: it holds the effective kind of
/// the innermost non-command cause, which decides the exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Kind of the fault itself.
    pub kind: FaultKind,
    /// Effective kind of the cause (command faults only).
    pub cause: Option<FaultKind>,
}

impl Classification {
    /// Classification without a cause.
    pub const fn of(kind: FaultKind) -> Self {
        Self { kind, cause: None }
    }
}
