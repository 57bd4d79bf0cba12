//! # Plan registry: keyed owner of plan records.
//!
//! The registry is the only writer of plan state. Every change goes through one
//! path: legality check, persist through the [`PlanStore`], apply in memory, publish.
//!
//! ## Architecture
//! ```text
//! PlanRegistry
//!   plans: RwLock<HashMap<PlanId, Arc<Entry>>>     (map lock held only for lookups)
//!   Entry
//!     record:    Mutex<PlanRecord>                 (per-plan serialization point)
//!     state:     watch::Sender<PlanState>          (wakes cancel waiters)
//!     interrupt: CancellationToken                 (observed by the running task)
//! ```
//!
//! ## Rules
//! - Transitions for one plan are linearizable: they are decided and applied while
//!   holding that plan's record lock, so no transition is based on stale state.
//! - Different plans never contend beyond the short map lookup.
//! - A store failure aborts the transition; the in-memory record is unchanged.
//! - Self transitions (`Success → Success`, ...) succeed without persisting.
//!
//! ## Cancel protocol
//! ```text
//! request_cancel(id, wait)
//!   1. lock, read state; Running → InterruptRequested (token cancelled); unlock
//!   2. in flight and wait > 0 → wait_for(state leaves Running/IR) under timeout(wait)
//!   3. lock, re-read
//!   4. Interrupted | Error       → Canceled                 (CancelOutcome::Canceled)
//!   5. Success | Canceled        → unchanged                (CancelOutcome::AlreadyTerminal)
//!      Running | IR              → unchanged                (CancelOutcome::StillRunning)
//!   6. Created | Approved        → Fault::Assertion
//! ```
//! The wait only releases the worker and never forces the plan to stop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{PlanError, TaskError};
use crate::events::{Diagnostics, Event, EventKind};
use crate::faults::Fault;
use crate::plans::record::{CancelOutcome, CancelReport, ExecutionInfo, PlanId, PlanRecord};
use crate::plans::state::PlanState;
use crate::plans::store::PlanStore;

struct Entry {
    record: Mutex<PlanRecord>,
    state: watch::Sender<PlanState>,
    interrupt: CancellationToken,
}

impl Entry {
    fn new(record: PlanRecord) -> Arc<Self> {
        let (state, _) = watch::channel(record.state);
        let interrupt = CancellationToken::new();
        if !matches!(
            record.state,
            PlanState::Created | PlanState::Approved | PlanState::Running
        ) {
            interrupt.cancel();
        }
        Arc::new(Self {
            record: Mutex::new(record),
            state,
            interrupt,
        })
    }
}

/// Keyed registry of plans.
pub struct PlanRegistry {
    plans: RwLock<HashMap<PlanId, Arc<Entry>>>,
    next_id: AtomicU64,
    restored: AtomicBool,
    store: Arc<dyn PlanStore>,
    diagnostics: Diagnostics,
}

impl PlanRegistry {
    pub fn new(store: Arc<dyn PlanStore>, diagnostics: Diagnostics) -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            restored: AtomicBool::new(false),
            store,
            diagnostics,
        }
    }

    /// Reloads plans from the store.
    ///
    /// Plans left `Running`/`InterruptRequested` by a previous incarnation have no
    /// worker anymore; they are moved through `InterruptRequested` to `Interrupted` so
    /// they can be cancelled. Returns the number of loaded plans.
    ///
    /// Runs at most once. Ids already registered in this process are skipped: their
    /// workers are alive and own the in-memory entry.
    pub async fn restore(&self) -> Result<usize, Fault> {
        if self.restored.swap(true, Ordering::AcqRel) {
            return Err(PlanError::AlreadyRestored.into());
        }
        let records = self.store.load_all().await?;
        let max_id = records.iter().map(|r| r.id.0).max().unwrap_or(0);
        self.next_id.fetch_max(max_id + 1, Ordering::AcqRel);

        let mut count = 0;
        for record in records {
            if self.plans.read().await.contains_key(&record.id) {
                continue;
            }
            count += 1;
            let stale = record.state.is_in_flight();
            let entry = Entry::new(record);
            if stale {
                let mut rec = entry.record.lock().await;
                self.apply(&entry, &mut rec, PlanState::InterruptRequested, None)
                    .await?;
                self.apply(
                    &entry,
                    &mut rec,
                    PlanState::Interrupted,
                    Some("worker lost on restart".to_string()),
                )
                .await?;
            }
            let id = entry.record.lock().await.id;
            self.plans.write().await.entry(id).or_insert(entry);
        }

        Ok(count)
    }

    /// Registers a new plan in `Created`.
    pub async fn create(
        &self,
        name: &str,
        namespace: &str,
        statement: &str,
    ) -> Result<ExecutionInfo, Fault> {
        let id = PlanId(self.next_id.fetch_add(1, Ordering::AcqRel));
        let record = PlanRecord::new(id, name, namespace, statement);
        self.store.persist(&record).await?;

        let info = ExecutionInfo::from(&record);
        self.plans.write().await.insert(id, Entry::new(record));
        self.diagnostics.record(
            Event::new(EventKind::PlanCreated)
                .with_plan(id)
                .with_plan_state(PlanState::Created)
                .with_reason(name),
        );
        Ok(info)
    }

    /// Applies a legal transition.
    ///
    /// Illegal pairs fail with an `ILLEGAL_STATE` command fault and change nothing.
    pub async fn transition(&self, id: PlanId, to: PlanState) -> Result<ExecutionInfo, Fault> {
        let entry = self.entry(id).await?;
        let mut rec = entry.record.lock().await;
        self.apply(&entry, &mut rec, to, None).await?;
        Ok(ExecutionInfo::from(&*rec))
    }

    /// `Approved → Running`; returns the token the worker must observe.
    pub async fn start(&self, id: PlanId) -> Result<CancellationToken, Fault> {
        let entry = self.entry(id).await?;
        let mut rec = entry.record.lock().await;
        self.apply(&entry, &mut rec, PlanState::Running, None).await?;
        Ok(entry.interrupt.clone())
    }

    /// Current snapshot of a plan.
    pub async fn status(&self, id: PlanId) -> Result<ExecutionInfo, Fault> {
        let entry = self.entry(id).await?;
        let rec = entry.record.lock().await;
        Ok(ExecutionInfo::from(&*rec))
    }

    /// All plans ordered by id.
    pub async fn list(&self) -> Vec<ExecutionInfo> {
        let entries: Vec<Arc<Entry>> = self.plans.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(ExecutionInfo::from(&*entry.record.lock().await));
        }
        out.sort_by_key(|info| info.id);
        out
    }

    /// Requests a cooperative stop of a running plan.
    ///
    /// `Running → InterruptRequested`. Already requested, interrupted or terminal
    /// plans are left as they are. `Created`/`Approved` plans are rejected.
    pub async fn interrupt(&self, id: PlanId) -> Result<ExecutionInfo, Fault> {
        let entry = self.entry(id).await?;
        let mut rec = entry.record.lock().await;
        self.interrupt_locked(&entry, &mut rec).await?;
        Ok(ExecutionInfo::from(&*rec))
    }

    /// Interrupts every running plan; returns the ids still in flight.
    pub async fn interrupt_all(&self) -> Vec<PlanId> {
        let entries: Vec<Arc<Entry>> = self.plans.read().await.values().cloned().collect();
        let mut in_flight = Vec::new();
        for entry in entries {
            let mut rec = entry.record.lock().await;
            if !rec.state.is_in_flight() {
                continue;
            }
            in_flight.push(rec.id);
            if let Err(fault) = self.interrupt_locked(&entry, &mut rec).await {
                tracing::warn!(plan = %rec.id, %fault, "interrupt during close failed");
            }
        }
        in_flight.sort();
        in_flight
    }

    /// Interrupts (when running), waits up to `wait` for the plan to stop, then cancels.
    ///
    /// A zero `wait` samples the state without waiting. See the module docs for the
    /// full protocol.
    pub async fn request_cancel(&self, id: PlanId, wait: Duration) -> Result<CancelReport, Fault> {
        let entry = self.entry(id).await?;

        let in_flight = {
            let mut rec = entry.record.lock().await;
            if rec.state.is_in_flight() {
                self.interrupt_locked(&entry, &mut rec).await?;
                true
            } else {
                false
            }
        };

        if in_flight && !wait.is_zero() {
            let mut rx = entry.state.subscribe();
            // Timing out is a normal outcome: the report below carries the state.
            let _ = tokio::time::timeout(wait, rx.wait_for(|s| !s.is_in_flight())).await;
        }

        let mut rec = entry.record.lock().await;
        let outcome = match rec.state {
            PlanState::Interrupted | PlanState::Error => {
                self.apply(&entry, &mut rec, PlanState::Canceled, None)
                    .await?;
                CancelOutcome::Canceled
            }
            PlanState::Success | PlanState::Canceled => CancelOutcome::AlreadyTerminal,
            PlanState::Running | PlanState::InterruptRequested => CancelOutcome::StillRunning,
            state @ (PlanState::Created | PlanState::Approved) => {
                return Err(Fault::assertion(format!(
                    "cancel of {id}: unexpected state {state} after interrupt wait"
                )));
            }
        };

        self.diagnostics.record(
            Event::new(EventKind::CancelRequested)
                .with_plan(id)
                .with_plan_state(rec.state)
                .with_reason(outcome.as_label()),
        );
        Ok(CancelReport {
            info: ExecutionInfo::from(&*rec),
            outcome,
        })
    }

    /// Records the worker's result.
    ///
    /// - `Ok` → `Success`
    /// - `Interrupted` while an interrupt was requested → `Interrupted`
    /// - any other error → `Error` with the message stored on the record
    pub async fn finish(
        &self,
        id: PlanId,
        result: &Result<(), TaskError>,
    ) -> Result<ExecutionInfo, Fault> {
        let entry = self.entry(id).await?;
        let mut rec = entry.record.lock().await;
        let (to, error) = match result {
            Ok(()) => (PlanState::Success, None),
            Err(TaskError::Interrupted) if rec.state == PlanState::InterruptRequested => {
                (PlanState::Interrupted, None)
            }
            Err(err) => (PlanState::Error, Some(err.as_message())),
        };
        self.apply(&entry, &mut rec, to, error).await?;
        Ok(ExecutionInfo::from(&*rec))
    }

    async fn entry(&self, id: PlanId) -> Result<Arc<Entry>, Fault> {
        self.plans
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(id).into())
    }

    async fn interrupt_locked(&self, entry: &Entry, rec: &mut PlanRecord) -> Result<(), Fault> {
        match rec.state {
            PlanState::Running => {
                self.apply(entry, rec, PlanState::InterruptRequested, None)
                    .await?;
                self.diagnostics.record(
                    Event::new(EventKind::InterruptRequested)
                        .with_plan(rec.id)
                        .with_plan_state(rec.state),
                );
                Ok(())
            }
            PlanState::Created | PlanState::Approved => Err(PlanError::IllegalTransition {
                plan: rec.id,
                from: rec.state,
                to: PlanState::InterruptRequested,
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Single write path. Caller holds the plan's record lock.
    async fn apply(
        &self,
        entry: &Entry,
        rec: &mut PlanRecord,
        to: PlanState,
        error: Option<String>,
    ) -> Result<(), Fault> {
        let from = rec.state;
        if !from.can_transition(to) {
            return Err(PlanError::IllegalTransition {
                plan: rec.id,
                from,
                to,
            }
            .into());
        }
        if from == to {
            return Ok(());
        }

        let next = rec.moved_to(to, error);
        self.store.persist(&next).await?;
        *rec = next;

        if to == PlanState::InterruptRequested {
            entry.interrupt.cancel();
        }
        entry.state.send_replace(to);
        self.diagnostics.record(
            Event::new(EventKind::PlanTransitioned)
                .with_plan(rec.id)
                .with_transition(from, to),
        );
        Ok(())
    }
}
