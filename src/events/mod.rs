//! Diagnostic records and the sink that distributes them.
//!
//! ## Contents
//! - [`Event`], [`EventKind`], [`Severity`] record data model
//! - [`Diagnostics`] cloneable sink over the subscriber fan-out
//!
//! ## Quick reference
//! - **Publishers**: `ExitPolicy` (severe fault records), `ShutdownCoordinator`,
//!   `OperationExecutor`, `PlanRegistry`, `AdminService` (close path).
//! - **Consumers**: [`Subscribe`](crate::Subscribe) implementations such as
//!   [`LogWriter`](crate::LogWriter) and [`EventLog`](crate::EventLog).

mod event;
mod sink;

pub use event::{Event, EventKind, Severity};
pub use sink::Diagnostics;
