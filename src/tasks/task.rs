//! # Plan task abstraction.
//!
//! A [`PlanTask`] is the work behind a plan: what an administrative action actually
//! does. The runner calls [`run`](PlanTask::run) once, with the plan's interrupt
//! token; the task decides when (if ever) to honor an interrupt request.
//!
//! The common handle type is [`PlanTaskRef`], an `Arc<dyn PlanTask>`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Asynchronous, interruptible plan work.
///
/// Returning [`TaskError::Interrupted`] after observing the token moves the plan to
/// `Interrupted`; returning `Ok` even after an interrupt request moves it to `Success`.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use adminvisor::{PlanTask, TaskError};
///
/// struct Compact;
///
/// #[async_trait]
/// impl PlanTask for Compact {
///     fn name(&self) -> &str { "compact" }
///
///     async fn run(&self, interrupt: CancellationToken) -> Result<(), TaskError> {
///         for _segment in 0..16 {
///             if interrupt.is_cancelled() {
///                 return Err(TaskError::Interrupted);
///             }
///             // compact one segment...
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PlanTask: Send + Sync + 'static {
    /// Stable, human-readable name stored on the plan record.
    fn name(&self) -> &str;

    /// Executes the plan until completion or until it honors an interrupt.
    async fn run(&self, interrupt: CancellationToken) -> Result<(), TaskError>;
}

/// Shared handle to a plan task.
pub type PlanTaskRef = Arc<dyn PlanTask>;
