//! # Persistent plan store.
//!
//! [`PlanStore`] is the durable home of plan records. The registry persists every
//! state change through it before applying the change in memory; a failed `persist`
//! aborts the transition and leaves the in-memory state untouched.
//!
//! Store failures are reported as [`Fault::Storage`](crate::Fault::Storage) (or
//! [`Fault::EnvironmentCorrupted`](crate::Fault::EnvironmentCorrupted) when the store
//! detects unrecoverable damage).

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::faults::Fault;
use crate::plans::record::{PlanId, PlanRecord};

/// Durable plan storage.
#[async_trait]
pub trait PlanStore: Send + Sync + 'static {
    /// Every stored plan, any order.
    async fn load_all(&self) -> Result<Vec<PlanRecord>, Fault>;

    /// One plan by id.
    async fn load(&self, id: PlanId) -> Result<Option<PlanRecord>, Fault>;

    /// Writes `record` in one transaction: committed as a whole or not at all.
    async fn persist(&self, record: &PlanRecord) -> Result<(), Fault>;
}

/// In-memory [`PlanStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<PlanId, PlanRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = PlanRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, BTreeMap<PlanId, PlanRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<PlanRecord>, Fault> {
        Ok(self.guard().values().cloned().collect())
    }

    async fn load(&self, id: PlanId) -> Result<Option<PlanRecord>, Fault> {
        Ok(self.guard().get(&id).cloned())
    }

    async fn persist(&self, record: &PlanRecord) -> Result<(), Fault> {
        self.guard().insert(record.id, record.clone());
        Ok(())
    }
}
