//! # EventLog: in-memory record of diagnostics
//!
//! Keeps every received [`Event`] (up to a bound) so callers can inspect what the
//! admin core reported. Used by tests and by embedded hosts that render diagnostics
//! themselves.
//!
//! ## Behavior
//! - Records are kept in arrival order; once `limit` is reached the oldest is dropped.
//! - [`EventLog::snapshot`] returns a copy; pair it with
//!   [`Diagnostics::flush_all`](crate::Diagnostics::flush_all) to observe everything
//!   written so far.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Bounded in-memory record store.
pub struct EventLog {
    inner: Mutex<VecDeque<Event>>,
    limit: usize,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            limit: 4096,
        }
    }

    /// Configure how many records are retained.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Returns a copy of the retained records, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        let g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        g.iter().cloned().collect()
    }

    /// Number of retained records of the given kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        let g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        g.iter().filter(|e| e.kind == kind).count()
    }
}

#[async_trait]
impl Subscribe for EventLog {
    async fn on_event(&self, ev: &Event) {
        let mut g = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if g.len() == self.limit {
            g.pop_front();
        }
        g.push_back(ev.clone());
    }

    fn name(&self) -> &'static str {
        "EventLog"
    }

    fn queue_capacity(&self) -> usize {
        4096
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
