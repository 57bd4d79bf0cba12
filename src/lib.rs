//! # adminvisor
//!
//! **Adminvisor** is the failure-management and operation-lifecycle core of a
//! distributed database's administrative service.
//!
//! Every administrative request funnels through it so that faults are classified
//! consistently, the process decides whether to continue, restart or stop for good,
//! and long-running administrative operations ("plans") can be interrupted and
//! cancelled remotely without leaving the service inconsistent.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   remote call (identity, statement | plan id)
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  AdminService                                                     │
//! │  execute / get_execution_status / interrupt_and_cancel / close    │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//! ┌───────────────────────────┐  fault   ┌──────────────────┐
//! │  OperationExecutor        │─────────►│ FaultClassifier  │─► Classification
//! │  auth, catch_unwind,      │          └──────────────────┘        │
//! │  normalize to ClientFault │◄─────────┐                           ▼
//! └──────┬────────────────────┘          │  Outcome  ┌──────────────────┐
//!        │ ok path                       └───────────│   ExitPolicy     │
//!        ▼                                           └────────┬─────────┘
//! ┌───────────────────────────┐                               │ Restart | NoRestart
//! │  PlanRegistry / Runner    │                               ▼
//! │  per-plan lock + watch    │                  ┌───────────────────────────┐
//! │  interrupt / cancel       │                  │  ShutdownCoordinator      │
//! │  PlanStore (persist)      │                  │  CAS Running → Error*     │
//! └──────┬────────────────────┘                  │  detached worker:         │
//!        │ worker faults                         │  status, flush, terminate │
//!        └──► OperationExecutor::handle_fault    └───────────────────────────┘
//!
//! All components ──► Diagnostics ──► SubscriberSet ──► LogWriter | EventLog | custom
//! ```
//!
//! ### Fault path
//! ```text
//! Fault ─► classify ─► decide(kind, ServiceState)
//!            ├─ None     ─► client fault only
//!            ├─ LogOnly  ─► severe record, process continues
//!            ├─ Restart  ─► coordinator: exit 75, process manager restarts
//!            └─ NoRestart─► coordinator: exit 70, operator intervention
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Faults**        | Tagged-union faults, classification, client-safe form.      | [`Fault`], [`FaultClassifier`], [`ClientFault`] |
//! | **Policies**      | Process-level outcome of a classified fault.                 | [`ExitPolicy`], [`Outcome`]                 |
//! | **Shutdown**      | At-most-once termination, graceful close.                    | [`ShutdownCoordinator`], [`Terminate`]      |
//! | **Plans**         | State machine, registry, interrupt / cancel protocol.        | [`PlanRegistry`], [`PlanState`], [`PlanTask`] |
//! | **Subscriber API**| Hook into diagnostics (logging, audit, tests).               | [`Subscribe`], [`LogWriter`], [`EventLog`]  |
//! | **Errors**        | Typed errors for plans, tasks and the runtime.               | [`TaskError`], [`PlanError`], [`RuntimeError`] |
//! | **Configuration** | Centralize runtime settings.                                 | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use adminvisor::{
//!     AdminService, CommandHandler, Config, Fault, Identity, PlanTaskRef, TaskError, TaskFn,
//! };
//!
//! struct Handler;
//!
//! #[async_trait]
//! impl CommandHandler for Handler {
//!     async fn prepare(&self, statement: &str, _ns: &str) -> Result<PlanTaskRef, Fault> {
//!         let name = statement.to_lowercase();
//!         Ok(TaskFn::arc(name, |interrupt: CancellationToken| async move {
//!             interrupt.cancelled().await;
//!             Err(TaskError::Interrupted)
//!         }))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = AdminService::builder(Config::default(), Arc::new(Handler)).build();
//!     let who = Identity::new("operator");
//!
//!     let plan = svc.execute(&who, "REBUILD INDEX", "sales").await?;
//!     let report = svc
//!         .interrupt_and_cancel(&who, plan.id, Duration::from_secs(1))
//!         .await?;
//!     println!("{} -> {}", plan.id, report.info.state);
//!
//!     svc.close().await?;
//!     Ok(())
//! }
//! ```

mod auth;
mod core;
mod error;
mod events;
mod faults;
mod plans;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use auth::{AllowAll, Authorize, Identity, Privilege};
pub use core::{
    AdminService, AdminServiceBuilder, Config, EXIT_NO_RESTART, EXIT_RESTART, MemoryStatus,
    OperationExecutor, ProcessExit, ServiceState, ShutdownCoordinator, ShutdownSignal,
    StatusTracker, Terminate, wait_for_shutdown_signal,
};
pub use error::{FlushError, PlanError, RuntimeError, TaskError};
pub use events::{Diagnostics, Event, EventKind, Severity};
pub use faults::{
    Classification, ClientFault, ErrorCode, Fault, FaultClassifier, FaultKind, Visibility,
};
pub use plans::{
    CancelOutcome, CancelReport, ExecutionInfo, MemoryStore, PlanId, PlanRecord, PlanRegistry,
    PlanRunner, PlanState, PlanStore,
};
pub use policies::{ExitPolicy, Outcome};
pub use subscribers::{EventLog, LogWriter, Subscribe, SubscriberSet};
pub use tasks::{CommandHandler, PlanTask, PlanTaskRef, TaskFn};
