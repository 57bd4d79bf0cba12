//! # Function-backed plan task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing the plan's
//! future when the runner starts it. State shared with the caller goes through an
//! explicit `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use adminvisor::{PlanTaskRef, TaskError, TaskFn};
//!
//! let t: PlanTaskRef = TaskFn::arc("rebalance", |interrupt: CancellationToken| async move {
//!     if interrupt.is_cancelled() {
//!         return Err(TaskError::Interrupted);
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(t.name(), "rebalance");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::PlanTask;

/// Function-backed plan task.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Prefer [`TaskFn::arc`] when you immediately need a [`PlanTaskRef`](crate::PlanTaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> PlanTask for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, interrupt: CancellationToken) -> Result<(), TaskError> {
        (self.f)(interrupt).await
    }
}
