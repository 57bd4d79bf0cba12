//! # Diagnostic records emitted by the admin core.
//!
//! The [`EventKind`] enum classifies records across three groups:
//! - **Fault events**: severe fault records, recorded triggering faults, normalized failures
//! - **Shutdown events**: fatal outcomes acted upon or suppressed, graceful close
//! - **Plan events**: creation, transitions, interrupt/cancel requests
//!
//! Each record carries a [`Severity`] and a globally unique, monotonically increasing
//! sequence number (`seq`) so that records delivered to different subscribers can be
//! put back in order.
//!
//! ## Example
//! ```rust
//! use adminvisor::{Event, EventKind, Severity};
//!
//! let ev = Event::new(EventKind::FaultLogged)
//!     .with_operation("execute")
//!     .with_reason("storage failure: txn aborted");
//!
//! assert_eq!(ev.severity, Severity::Severe);
//! assert_eq!(ev.operation.as_deref(), Some("execute"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::ServiceState;
use crate::faults::FaultKind;
use crate::plans::{PlanId, PlanState};
use crate::policies::Outcome;

/// Global sequence counter for record ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Severity tag of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine lifecycle information.
    Info,
    /// Unexpected but handled condition.
    Warning,
    /// Fault requiring operator attention.
    Severe,
}

/// Classification of diagnostic records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Fault events ===
    /// Severe record written by the exit policy for LogOnly/Restart/NoRestart outcomes.
    ///
    /// Sets: `operation`, `fault`, `outcome`, `reason` (fault text).
    FaultLogged,

    /// An operation returned a normalized fault to its caller.
    ///
    /// Sets: `operation`, `fault`, `reason` (client-facing code).
    OperationFailed,

    // === Shutdown events ===
    /// A fatal outcome was accepted; the service is leaving `Running`.
    ///
    /// Sets: `outcome`, `state`, `reason`.
    ShutdownInitiated,

    /// A fatal outcome arrived while the service was already shutting down.
    ///
    /// Sets: `outcome`, `state` (current), `reason`.
    ShutdownSuppressed,

    /// Diagnostics could not be flushed before termination.
    FlushFailed,

    /// Graceful close requested.
    ServiceClosing,

    /// All plan workers stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some plan workers did not stop in time.
    GraceExceeded,

    // === Plan events ===
    /// Plan record created.
    ///
    /// Sets: `plan`, `to`, `reason` (plan name).
    PlanCreated,

    /// Plan state changed.
    ///
    /// Sets: `plan`, `from`, `to`.
    PlanTransitioned,

    /// Interrupt requested for a running plan.
    InterruptRequested,

    /// Cancel requested; `reason` reports the outcome.
    CancelRequested,
}

impl EventKind {
    /// Severity of records of this kind.
    pub const fn default_severity(self) -> Severity {
        match self {
            EventKind::FaultLogged | EventKind::ShutdownInitiated => Severity::Severe,
            EventKind::ShutdownSuppressed
            | EventKind::FlushFailed
            | EventKind::GraceExceeded
            | EventKind::OperationFailed => Severity::Warning,
            EventKind::ServiceClosing
            | EventKind::AllStoppedWithin
            | EventKind::PlanCreated
            | EventKind::PlanTransitioned
            | EventKind::InterruptRequested
            | EventKind::CancelRequested => Severity::Info,
        }
    }
}

/// Diagnostic record with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Record classification.
    pub kind: EventKind,
    /// Severity tag.
    pub severity: Severity,
    /// Human-readable reason (fault text, codes, details).
    pub reason: Option<Arc<str>>,
    /// Administrative operation name, if applicable.
    pub operation: Option<Arc<str>>,
    /// Plan id, if applicable.
    pub plan: Option<PlanId>,
    /// Previous plan state (transitions).
    pub from: Option<PlanState>,
    /// New plan state (transitions).
    pub to: Option<PlanState>,
    /// Fault kind, if applicable.
    pub fault: Option<FaultKind>,
    /// Exit outcome, if applicable.
    pub outcome: Option<Outcome>,
    /// Service state, if applicable.
    pub state: Option<ServiceState>,
}

impl Event {
    /// Creates a record of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            severity: kind.default_severity(),
            reason: None,
            operation: None,
            plan: None,
            from: None,
            to: None,
            fault: None,
            outcome: None,
            state: None,
        }
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_operation(mut self, operation: impl Into<Arc<str>>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    #[inline]
    pub fn with_plan(mut self, plan: PlanId) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Attaches a plan transition.
    #[inline]
    pub fn with_transition(mut self, from: PlanState, to: PlanState) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Attaches a plan state without a previous state.
    #[inline]
    pub fn with_plan_state(mut self, state: PlanState) -> Self {
        self.to = Some(state);
        self
    }

    #[inline]
    pub fn with_fault(mut self, kind: FaultKind) -> Self {
        self.fault = Some(kind);
        self
    }

    #[inline]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[inline]
    pub fn with_state(mut self, state: ServiceState) -> Self {
        self.state = Some(state);
        self
    }
}
