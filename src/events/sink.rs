//! # Diagnostics sink shared by all components.
//!
//! [`Diagnostics`] is a cheap, cloneable handle over a [`SubscriberSet`]. It is the
//! single place where the classifier, exit policy, shutdown coordinator and plan
//! registry write severity-tagged records.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Subscribers:
//!   ExitPolicy          ──┐
//!   ShutdownCoordinator ──┼──► Diagnostics ──► SubscriberSet ──► [queue] ─► LogWriter
//!   OperationExecutor   ──┤     record()                     ──► [queue] ─► EventLog
//!   PlanRegistry        ──┘     flush_all()                  ──► [queue] ─► custom
//! ```
//!
//! ## Rules
//! - **Non-blocking record**: `record()` never waits on subscribers.
//! - **Flush barrier**: `flush_all()` resolves once every record written before the call
//!   has been handled by every subscriber and each subscriber's own `flush` hook ran.
//! - **Bounded**: callers that must not hang wrap `flush_all()` in a timeout.

use std::sync::Arc;

use crate::error::FlushError;
use crate::events::Event;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Cloneable handle for writing diagnostic records.
#[derive(Clone)]
pub struct Diagnostics {
    set: Arc<SubscriberSet>,
}

impl Diagnostics {
    /// Creates a sink and spawns one worker per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            set: Arc::new(SubscriberSet::new(subscribers)),
        }
    }

    /// Sink without subscribers; records are discarded.
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    /// Writes one record (non-blocking fan-out).
    pub fn record(&self, ev: Event) {
        self.set.emit(&ev);
    }

    /// Waits until every record written so far has been handled by all subscribers.
    pub async fn flush_all(&self) -> Result<(), FlushError> {
        self.set.flush().await
    }

    /// Closes subscriber queues and waits for workers to drain.
    pub async fn shutdown(&self) {
        self.set.close().await;
    }
}
