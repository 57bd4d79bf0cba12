//! # Exit policy: what the process does about a classified fault.
//!
//! [`ExitPolicy`] turns a [`Classification`] and the current [`ServiceState`] into an
//! [`Outcome`]:
//!
//! ```text
//! service already leaving Running ─► outcome recorded by that state (no new action)
//! InternalPassThrough / WrappedClientFault / ClientAccessDenied ─► None
//! AssertionFailure / UnsupportedOperation / StorageFault        ─► LogOnly
//! EnvironmentCorrupted                                          ─► NoRestart
//! CommandFault { cause: k }                                     ─► outcome(k), None without cause
//! Unclassified                                                  ─► Restart
//! ```
//!
//! [`ExitPolicy::outcome`] is pure. [`ExitPolicy::decide`] additionally writes one
//! severe diagnostic record for every LogOnly/Restart/NoRestart outcome, unless fault
//! logging is suppressed or the service runs embedded in a host that owns console
//! output.
//!
//! Faults raised while a graceful close is in progress (for example by a plan worker
//! during the grace period) take the `ClosingVoluntarily` outcome, `None`: even an
//! `EnvironmentCorrupted` fault is not escalated to a no-restart exit then.

use std::fmt;

use crate::core::{Config, ServiceState};
use crate::events::{Diagnostics, Event, EventKind};
use crate::faults::{Classification, Fault, FaultKind};

/// Process-level action decided for a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Nothing to do: the fault is returned to the caller only.
    None,
    /// Write a severe record; the process continues.
    LogOnly,
    /// Shut down; the process manager restarts the service.
    Restart,
    /// Shut down permanently; operator intervention required.
    NoRestart,
}

impl Outcome {
    /// True when the outcome terminates the service.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Outcome::Restart | Outcome::NoRestart)
    }

    /// Process exit code for fatal outcomes.
    pub fn exit_code(self, cfg: &Config) -> Option<i32> {
        match self {
            Outcome::Restart => Some(cfg.restart_exit_code),
            Outcome::NoRestart => Some(cfg.no_restart_exit_code),
            Outcome::None | Outcome::LogOnly => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub const fn as_label(self) -> &'static str {
        match self {
            Outcome::None => "none",
            Outcome::LogOnly => "log_only",
            Outcome::Restart => "restart",
            Outcome::NoRestart => "no_restart",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Decides process outcomes and writes the matching severe records.
#[derive(Clone)]
pub struct ExitPolicy {
    diagnostics: Diagnostics,
    quiet: bool,
}

impl ExitPolicy {
    /// Creates a policy writing to `diagnostics`.
    pub fn new(cfg: &Config, diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            quiet: cfg.suppress_fault_log || cfg.embedded,
        }
    }

    /// Pure outcome for `class` given the current service state.
    pub fn outcome(class: &Classification, state: ServiceState) -> Outcome {
        if let Some(recorded) = state.recorded_outcome() {
            return recorded;
        }
        match class.kind {
            FaultKind::CommandFault => class.cause.map_or(Outcome::None, Self::outcome_for_kind),
            kind => Self::outcome_for_kind(kind),
        }
    }

    fn outcome_for_kind(kind: FaultKind) -> Outcome {
        match kind {
            FaultKind::InternalPassThrough
            | FaultKind::WrappedClientFault
            | FaultKind::ClientAccessDenied => Outcome::None,
            FaultKind::AssertionFailure
            | FaultKind::UnsupportedOperation
            | FaultKind::StorageFault => Outcome::LogOnly,
            FaultKind::EnvironmentCorrupted => Outcome::NoRestart,
            // A cause is never itself a command fault; treat a stray one as a defect.
            FaultKind::CommandFault | FaultKind::Unclassified => Outcome::Restart,
        }
    }

    /// Decides the outcome and writes one severe record when the outcome calls for it.
    ///
    /// Nothing is written when the service is already leaving `Running`: the outcome
    /// recorded by that state is returned without new action.
    pub fn decide(
        &self,
        operation: &str,
        fault: &Fault,
        class: &Classification,
        state: ServiceState,
    ) -> Outcome {
        let outcome = Self::outcome(class, state);
        if state != ServiceState::Running || self.quiet || outcome == Outcome::None {
            return outcome;
        }

        self.diagnostics.record(
            Event::new(EventKind::FaultLogged)
                .with_operation(operation)
                .with_fault(class.kind)
                .with_outcome(outcome)
                .with_reason(fault.to_string()),
        );
        outcome
    }
}
