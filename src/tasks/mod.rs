//! # Plan task abstractions.
//!
//! - [`PlanTask`] - trait for the interruptible work behind a plan
//! - [`TaskFn`] - closure-backed implementation
//! - [`PlanTaskRef`] - shared handle (`Arc<dyn PlanTask>`)
//! - [`CommandHandler`] - builds plan tasks from statements

mod handler;
mod task;
mod task_fn;

pub use handler::CommandHandler;
pub use task::{PlanTask, PlanTaskRef};
pub use task_fn::TaskFn;
