//! Error types used by the admin core and by plan tasks.
//!
//! This module defines the crate's own error enums:
//!
//! - [`TaskError`] errors returned by plan task executions.
//! - [`PlanError`] plan lookup and transition-legality errors.
//! - [`RuntimeError`] errors raised by the service runtime itself (graceful close).
//! - [`FlushError`] the diagnostics pipeline could not be flushed.
//!
//! Faults that cross the service boundary are modelled separately by
//! [`Fault`](crate::Fault); [`PlanError`] converts into one.

use std::time::Duration;

use thiserror::Error;

use crate::faults::{ErrorCode, Fault};
use crate::plans::{PlanId, PlanState};

/// # Errors produced by the admin runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Close grace period was exceeded; some plan workers were still running.
    #[error("close timeout {grace:?} exceeded; stuck plans: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Plans whose workers did not stop in time.
        stuck: Vec<PlanId>,
    },

    /// Waiting for an OS shutdown signal failed.
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use adminvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

/// # Errors produced by plan task execution.
///
/// The plan runner maps them onto terminal plan states:
/// `Interrupted` → `Interrupted` (when an interrupt was requested), anything else → `Error`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task observed an interrupt request and stopped.
    #[error("interrupted")]
    Interrupted,

    /// Task failed; the message is stored on the plan record.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task raised a fault that must go through classification and exit policy.
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use adminvisor::TaskError;
    ///
    /// let err = TaskError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Interrupted => "task_interrupted",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fault(_) => "task_fault",
        }
    }

    /// Returns a human-readable message stored on the failed plan.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Interrupted => "interrupted".to_string(),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fault(f) => format!("fault: {f}"),
        }
    }
}

/// # Plan lookup and transition errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// No plan with this id is registered.
    #[error("plan {0} not found")]
    NotFound(PlanId),

    /// The requested transition is not in the legal transition table.
    #[error("plan {plan}: illegal transition {from} -> {to}")]
    IllegalTransition {
        /// Plan id.
        plan: PlanId,
        /// Current state (unchanged).
        from: PlanState,
        /// Requested state.
        to: PlanState,
    },

    /// Plans were already reloaded from the store for this service.
    #[error("plans already restored")]
    AlreadyRestored,
}

impl PlanError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PlanError::NotFound(_) => "plan_not_found",
            PlanError::IllegalTransition { .. } => "plan_illegal_transition",
            PlanError::AlreadyRestored => "plan_already_restored",
        }
    }
}

impl From<PlanError> for Fault {
    fn from(err: PlanError) -> Self {
        let code = match err {
            PlanError::NotFound(_) => ErrorCode::NotFound,
            PlanError::IllegalTransition { .. } | PlanError::AlreadyRestored => {
                ErrorCode::IllegalState
            }
        };
        Fault::command(code, err.to_string())
    }
}

/// # Diagnostics flush failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushError {
    /// The subscriber's worker is gone.
    #[error("subscriber '{subscriber}' closed before flush completed")]
    Closed {
        /// Subscriber name.
        subscriber: &'static str,
    },

    /// The subscriber panicked inside its flush hook.
    #[error("subscriber '{subscriber}' panicked during flush")]
    Panicked {
        /// Subscriber name.
        subscriber: &'static str,
    },
}
