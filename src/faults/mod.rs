//! Fault model and classification.
//!
//! ## Contents
//! - [`Fault`], [`ErrorCode`] raised faults and stable client codes
//! - [`FaultKind`], [`Classification`], [`Visibility`] normalized kinds
//! - [`FaultClassifier`] pure fault → kind mapping
//! - [`ClientFault`] the client-safe shape returned across the service boundary
//!
//! ## Quick wiring
//! ```text
//! Fault ──► FaultClassifier::classify ──► Classification ──► ExitPolicy::decide
//!   └──────────────────────────────────────► ClientFault::from_fault ──► caller
//! ```

mod classify;
mod fault;
mod kind;
mod public;

pub use classify::FaultClassifier;
pub use fault::{ErrorCode, Fault};
pub use kind::{Classification, FaultKind, Visibility};
pub use public::ClientFault;
