//! # Command handler collaborator.
//!
//! Turns an administrative statement into the [`PlanTaskRef`] that executes it.
//! Parsing and validation live here; a rejected statement is returned as a
//! [`Fault::Client`](crate::Fault::Client) or [`Fault::Command`](crate::Fault::Command).

use async_trait::async_trait;

use crate::faults::Fault;
use crate::tasks::task::PlanTaskRef;

/// Prepares plan tasks from statements.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Builds the task for `statement` in `namespace`.
    async fn prepare(&self, statement: &str, namespace: &str) -> Result<PlanTaskRef, Fault>;
}
