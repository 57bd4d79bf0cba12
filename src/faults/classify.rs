//! # Fault classification.
//!
//! [`FaultClassifier::classify`] is deterministic, side-effect free and total: every
//! fault shape maps to exactly one [`FaultKind`], with [`FaultKind::Unclassified`] as
//! the default.
//!
//! ## Rules (checked in order)
//! ```text
//! PassThrough / Client      ─► InternalPassThrough / WrappedClientFault (never re-wrapped)
//! AccessDenied              ─► ClientAccessDenied (cause crosses the boundary)
//! Command { cause }         ─► CommandFault, cause resolved recursively:
//!                                Command { cause: c } ─► resolve(c)
//!                                Defect               ─► Unclassified (restart)
//! Storage / Assertion / Unsupported / EnvironmentCorrupted ─► fixed kinds
//! Other(anyhow)             ─► downcast to Fault and recurse, else Unclassified
//! Defect                    ─► Unclassified
//! ```

use crate::faults::fault::Fault;
use crate::faults::kind::{Classification, FaultKind};

/// Pure mapping from [`Fault`] to [`Classification`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultClassifier;

impl FaultClassifier {
    /// Creates a classifier.
    pub const fn new() -> Self {
        Self
    }

    /// Classifies `fault`.
    pub fn classify(&self, fault: &Fault) -> Classification {
        match fault {
            Fault::PassThrough { .. } => Classification::of(FaultKind::InternalPassThrough),
            Fault::Client { .. } => Classification::of(FaultKind::WrappedClientFault),
            Fault::AccessDenied { .. } => Classification::of(FaultKind::ClientAccessDenied),
            Fault::Command { cause, .. } => Classification {
                kind: FaultKind::CommandFault,
                cause: cause.as_deref().and_then(|c| self.resolve_cause(c)),
            },
            Fault::Storage { .. } => Classification::of(FaultKind::StorageFault),
            Fault::Assertion { .. } => Classification::of(FaultKind::AssertionFailure),
            Fault::Unsupported { .. } => Classification::of(FaultKind::UnsupportedOperation),
            Fault::EnvironmentCorrupted { .. } => {
                Classification::of(FaultKind::EnvironmentCorrupted)
            }
            Fault::Defect { .. } => Classification::of(FaultKind::Unclassified),
            Fault::Other(err) => match err.downcast_ref::<Fault>() {
                Some(inner) => self.classify(inner),
                None => Classification::of(FaultKind::Unclassified),
            },
        }
    }

    /// Effective kind of a command cause; nested command faults are looked through.
    ///
    /// Returns `None` when the chain ends in a command fault without a cause.
    fn resolve_cause(&self, cause: &Fault) -> Option<FaultKind> {
        let class = self.classify(cause);
        match class.kind {
            FaultKind::CommandFault => class.cause,
            kind => Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::fault::ErrorCode;

    fn classify(f: &Fault) -> Classification {
        FaultClassifier::new().classify(f)
    }

    #[test]
    fn test_table_kinds() {
        let cases: Vec<(Fault, FaultKind)> = vec![
            (
                Fault::pass_through("sna", ErrorCode::NotFound, "no such node"),
                FaultKind::InternalPassThrough,
            ),
            (
                Fault::access_denied(Fault::client(ErrorCode::AccessDenied, "nope")),
                FaultKind::ClientAccessDenied,
            ),
            (
                Fault::client(ErrorCode::IllegalCommand, "bad ddl"),
                FaultKind::WrappedClientFault,
            ),
            (
                Fault::command(ErrorCode::PlanFailure, "plan failed"),
                FaultKind::CommandFault,
            ),
            (Fault::storage("txn aborted"), FaultKind::StorageFault),
            (Fault::assertion("counter < 0"), FaultKind::AssertionFailure),
            (
                Fault::unsupported("no secure store"),
                FaultKind::UnsupportedOperation,
            ),
            (Fault::corrupted("checksum"), FaultKind::EnvironmentCorrupted),
            (Fault::defect("index out of bounds"), FaultKind::Unclassified),
            (
                Fault::Other(anyhow::anyhow!("socket closed")),
                FaultKind::Unclassified,
            ),
        ];

        for (fault, expected) in cases {
            assert_eq!(classify(&fault).kind, expected, "fault {fault:?}");
        }
    }

    #[test]
    fn test_command_cause_resolved() {
        let f = Fault::command(ErrorCode::PlanFailure, "x").with_cause(Fault::corrupted("disk"));
        let class = classify(&f);
        assert_eq!(class.kind, FaultKind::CommandFault);
        assert_eq!(class.cause, Some(FaultKind::EnvironmentCorrupted));
    }

    #[test]
    fn test_command_defect_cause_is_unclassified() {
        let f = Fault::command(ErrorCode::PlanFailure, "x").with_cause(Fault::defect("oops"));
        assert_eq!(classify(&f).cause, Some(FaultKind::Unclassified));
    }

    #[test]
    fn test_nested_command_looked_through() {
        let inner =
            Fault::command(ErrorCode::IllegalState, "inner").with_cause(Fault::assertion("bad"));
        let outer = Fault::command(ErrorCode::PlanFailure, "outer").with_cause(inner);
        assert_eq!(classify(&outer).cause, Some(FaultKind::AssertionFailure));

        let bare = Fault::command(ErrorCode::PlanFailure, "outer")
            .with_cause(Fault::command(ErrorCode::IllegalState, "inner"));
        assert_eq!(classify(&bare).cause, None);
    }

    #[test]
    fn test_command_without_cause() {
        let f = Fault::command(ErrorCode::IllegalCommand, "bad");
        assert_eq!(classify(&f), Classification::of(FaultKind::CommandFault));
    }

    #[test]
    fn test_anyhow_wrapping_fault_is_looked_through() {
        let f = Fault::Other(anyhow::Error::new(Fault::corrupted("log file")));
        assert_eq!(classify(&f).kind, FaultKind::EnvironmentCorrupted);
    }

    #[test]
    fn test_deterministic() {
        let f = Fault::storage("x");
        assert_eq!(classify(&f), classify(&f));
    }
}
