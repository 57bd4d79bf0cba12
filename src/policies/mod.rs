//! Process exit policy.
//!
//! This module holds the knob that controls **what the process does** after a fault
//! has been classified.
//!
//! ## Contents
//! - [`Outcome`] none / log-only / restart / no-restart
//! - [`ExitPolicy`] classification + service state → outcome (+ severe record)
//!
//! ## Quick wiring
//! ```text
//! OperationExecutor::handle_fault
//!      ├─► FaultClassifier::classify(fault)  → Classification
//!      ├─► ExitPolicy::decide(.., state)     → Outcome
//!      └─► ShutdownCoordinator::initiate      (Outcome != None)
//! ```
//!
//! ## Defaults
//! - Restart exit code `75`, no-restart exit code `70` (see [`Config`](crate::Config)).

mod exit;

pub use exit::{ExitPolicy, Outcome};
