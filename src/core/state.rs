//! # Process-wide service state.
//!
//! [`ServiceState`] lives in a [`StateCell`] owned by the
//! [`ShutdownCoordinator`](crate::ShutdownCoordinator). The only writes are single
//! compare-and-swap steps out of `Running`:
//!
//! ```text
//! Running ──(fatal outcome, coordinator)──► ErrorRestarting | ErrorNoRestart
//! Running ──(graceful close)──────────────► ClosingVoluntarily
//! ```
//!
//! Everything else reads. A failed CAS means another path already won; the loser
//! takes no action.
//!
//! The external status tracker ([`StatusTracker`]) is told about every change.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::policies::Outcome;

/// Lifecycle state of the service process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Accepting work.
    Running,
    /// Graceful close in progress.
    ClosingVoluntarily,
    /// Exiting after a fault; will be restarted.
    ErrorRestarting,
    /// Exiting after a fault; will not be restarted.
    ErrorNoRestart,
}

impl ServiceState {
    /// Outcome already decided by a non-running state.
    ///
    /// `None` while running: nothing has been decided yet.
    pub const fn recorded_outcome(self) -> Option<Outcome> {
        match self {
            ServiceState::Running => None,
            ServiceState::ClosingVoluntarily => Some(Outcome::None),
            ServiceState::ErrorRestarting => Some(Outcome::Restart),
            ServiceState::ErrorNoRestart => Some(Outcome::NoRestart),
        }
    }

    /// Error state a fatal outcome moves the service to.
    pub const fn for_outcome(outcome: Outcome) -> Option<ServiceState> {
        match outcome {
            Outcome::Restart => Some(ServiceState::ErrorRestarting),
            Outcome::NoRestart => Some(ServiceState::ErrorNoRestart),
            Outcome::None | Outcome::LogOnly => None,
        }
    }

    /// True for the two fault-driven exit states.
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            ServiceState::ErrorRestarting | ServiceState::ErrorNoRestart
        )
    }

    const fn to_u8(self) -> u8 {
        match self {
            ServiceState::Running => 0,
            ServiceState::ClosingVoluntarily => 1,
            ServiceState::ErrorRestarting => 2,
            ServiceState::ErrorNoRestart => 3,
        }
    }

    const fn from_u8(v: u8) -> ServiceState {
        match v {
            0 => ServiceState::Running,
            1 => ServiceState::ClosingVoluntarily,
            2 => ServiceState::ErrorRestarting,
            _ => ServiceState::ErrorNoRestart,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Running => "RUNNING",
            ServiceState::ClosingVoluntarily => "CLOSING",
            ServiceState::ErrorRestarting => "ERROR_RESTARTING",
            ServiceState::ErrorNoRestart => "ERROR_NO_RESTART",
        };
        f.write_str(s)
    }
}

/// Atomic holder of the [`ServiceState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ServiceState::Running.to_u8()))
    }

    pub(crate) fn load(&self) -> ServiceState {
        ServiceState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Single atomic check-and-set. Returns the observed state on failure.
    pub(crate) fn transition(
        &self,
        from: ServiceState,
        to: ServiceState,
    ) -> Result<(), ServiceState> {
        self.0
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ServiceState::from_u8)
    }
}

/// External service-status tracker.
///
/// Receives every service state change together with a human-readable reason.
/// Implementations must not block.
pub trait StatusTracker: Send + Sync + 'static {
    /// Records the new state.
    fn update(&self, state: ServiceState, reason: &str);
}

/// In-memory [`StatusTracker`] keeping the full history of updates.
#[derive(Debug, Default)]
pub struct MemoryStatus {
    history: Mutex<Vec<(ServiceState, String)>>,
}

impl MemoryStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest reported state, `Running` if nothing was reported.
    #[must_use]
    pub fn current(&self) -> ServiceState {
        self.history()
            .last()
            .map_or(ServiceState::Running, |(s, _)| *s)
    }

    /// All updates, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<(ServiceState, String)> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusTracker for MemoryStatus {
    fn update(&self, state: ServiceState, reason: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((state, reason.to_string()));
    }
}
