//! # Diagnostics subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations fed through [`Diagnostics`](crate::Diagnostics).
//!
//! ## Architecture
//! ```text
//! Diagnostics::record(Event) ──► SubscriberSet ──► per-subscriber queue + worker
//!                                                      │
//!                                      ┌───────────────┼──────────────┐
//!                                      ▼               ▼              ▼
//!                                  LogWriter        EventLog        Custom
//!                                  (tracing)       (in-memory)
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** – forward records elsewhere (`LogWriter`, alerting)
//! - **Stateful subscribers** – keep records for later inspection (`EventLog`)

mod log;
mod memory;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use memory::EventLog;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
