//! Plan records and the caller-facing snapshots built from them.

use std::fmt;
use std::time::SystemTime;

use crate::plans::state::PlanState;

/// Numeric plan identifier, allocated monotonically by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlanId(pub u64);

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan-{}", self.0)
    }
}

/// Stored plan record. Only the registry's transition API changes `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRecord {
    pub id: PlanId,
    pub name: String,
    pub namespace: String,
    pub statement: String,
    pub state: PlanState,
    /// Failure message once the plan reached `Error`.
    pub error: Option<String>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl PlanRecord {
    /// New record in `Created`.
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        namespace: impl Into<String>,
        statement: impl Into<String>,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            name: name.into(),
            namespace: namespace.into(),
            statement: statement.into(),
            state: PlanState::Created,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this record moved to `state`.
    pub(crate) fn moved_to(&self, state: PlanState, error: Option<String>) -> Self {
        let mut next = self.clone();
        next.state = state;
        if error.is_some() {
            next.error = error;
        }
        next.updated_at = SystemTime::now();
        next
    }
}

/// Snapshot of a plan returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    pub id: PlanId,
    pub name: String,
    pub namespace: String,
    pub state: PlanState,
    pub error: Option<String>,
    pub updated_at: SystemTime,
}

impl From<&PlanRecord> for ExecutionInfo {
    fn from(rec: &PlanRecord) -> Self {
        Self {
            id: rec.id,
            name: rec.name.clone(),
            namespace: rec.namespace.clone(),
            state: rec.state,
            error: rec.error.clone(),
            updated_at: rec.updated_at,
        }
    }
}

/// What a cancel request achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The plan moved to `Canceled`.
    Canceled,
    /// The plan was already `Success` or `Canceled`; nothing changed.
    AlreadyTerminal,
    /// The plan did not leave `Running`/`InterruptRequested` within the wait budget.
    /// The interrupt stays requested; the caller may retry.
    StillRunning,
}

impl CancelOutcome {
    pub const fn as_label(self) -> &'static str {
        match self {
            CancelOutcome::Canceled => "canceled",
            CancelOutcome::AlreadyTerminal => "already_terminal",
            CancelOutcome::StillRunning => "still_running",
        }
    }
}

/// Result of [`PlanRegistry::request_cancel`](crate::PlanRegistry::request_cancel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReport {
    /// Plan state at the end of the request.
    pub info: ExecutionInfo,
    pub outcome: CancelOutcome,
}
