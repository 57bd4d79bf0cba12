//! # Plan lifecycle.
//!
//! Long-running administrative operations ("plans") are tracked here.
//!
//! ## Contents
//! - [`PlanState`] state machine and its legality check
//! - [`PlanRecord`], [`ExecutionInfo`], [`CancelReport`] records and snapshots
//! - [`PlanStore`] durable storage collaborator, [`MemoryStore`] in-memory default
//! - [`PlanRegistry`] keyed owner of plan state; interrupt / cancel protocol
//! - [`PlanRunner`] spawns and tracks plan workers
//!
//! ```text
//! AdminService::execute ─► registry.create ─► transition(Approved) ─► runner.launch
//!                                                                        │
//!   interrupt_and_cancel ─► registry.request_cancel ◄── watch ── worker ─┘
//! ```

mod record;
mod registry;
mod runner;
mod state;
mod store;

pub use record::{CancelOutcome, CancelReport, ExecutionInfo, PlanId, PlanRecord};
pub use registry::PlanRegistry;
pub use runner::PlanRunner;
pub use state::PlanState;
pub use store::{MemoryStore, PlanStore};
