//! # LogWriter: forwards diagnostic records to `tracing`
//!
//! Severity maps onto tracing levels:
//!
//! | severity  | level   |
//! |-----------|---------|
//! | `Severe`  | `error` |
//! | `Warning` | `warn`  |
//! | `Info`    | `info`  |
//!
//! Records are emitted under the `adminvisor` target with structured fields, so any
//! `tracing` subscriber (fmt, json, OpenTelemetry) picks them up.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! ERROR adminvisor: fault logged seq=12 kind=FaultLogged operation="execute" fault=Some(Unclassified) outcome=Some(Restart) reason="runtime defect: boom"
//! INFO  adminvisor: plan transitioned seq=13 kind=PlanTransitioned plan=Some(7) from=Some(Running) to=Some(InterruptRequested)
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind, Severity};
use crate::subscribers::Subscribe;

/// Subscriber that writes every record through `tracing`.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn describe(kind: EventKind) -> &'static str {
    match kind {
        EventKind::FaultLogged => "fault logged",
        EventKind::OperationFailed => "operation failed",
        EventKind::ShutdownInitiated => "shutdown initiated",
        EventKind::ShutdownSuppressed => "shutdown already in progress",
        EventKind::FlushFailed => "diagnostics flush failed",
        EventKind::ServiceClosing => "service closing",
        EventKind::AllStoppedWithin => "all plan workers stopped within grace",
        EventKind::GraceExceeded => "grace exceeded",
        EventKind::PlanCreated => "plan created",
        EventKind::PlanTransitioned => "plan transitioned",
        EventKind::InterruptRequested => "interrupt requested",
        EventKind::CancelRequested => "cancel requested",
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let msg = describe(e.kind);
        let reason = e.reason.as_deref().unwrap_or("");
        let operation = e.operation.as_deref().unwrap_or("");

        match e.severity {
            Severity::Severe => tracing::error!(
                target: "adminvisor",
                seq = e.seq, kind = ?e.kind, operation, plan = ?e.plan,
                fault = ?e.fault, outcome = ?e.outcome, state = ?e.state, reason,
                "{msg}"
            ),
            Severity::Warning => tracing::warn!(
                target: "adminvisor",
                seq = e.seq, kind = ?e.kind, operation, plan = ?e.plan,
                fault = ?e.fault, outcome = ?e.outcome, state = ?e.state, reason,
                "{msg}"
            ),
            Severity::Info => tracing::info!(
                target: "adminvisor",
                seq = e.seq, kind = ?e.kind, operation, plan = ?e.plan,
                from = ?e.from, to = ?e.to, reason,
                "{msg}"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
