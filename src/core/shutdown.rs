//! # Shutdown coordinator: acts on fatal outcomes.
//!
//! [`ShutdownCoordinator`] owns the process-wide [`ServiceState`] and is the only
//! component that ends the process.
//!
//! ## Sequence
//! ```text
//! initiate(fault, Restart|NoRestart)
//!   ├─ CAS Running → Error*        (fails) ─► ShutdownSuppressed, return false
//!   ├─ remember fault, ShutdownInitiated
//!   ├─ embedded?  ─► status.update(state), return true      (host owns the process)
//!   └─ spawn detached worker, return true                   (caller never waits)
//!         yield_now                 (triggering call returns its response first)
//!         eprintln fault            (unless suppress_console)
//!         status.update(state, reason)
//!         timeout(flush_timeout, flush_all)   (failure/timeout logged, ignored)
//!         terminator.terminate(exit_code)
//! ```
//!
//! ## Rules
//! - At most one termination sequence per process: the CAS is the single guard.
//! - Shutdown never hangs on diagnostics.
//! - The graceful path ([`begin_close`](ShutdownCoordinator::begin_close)) uses the same
//!   CAS, so a fault racing a close loses (and vice versa).

use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::core::config::Config;
use crate::core::state::{ServiceState, StateCell, StatusTracker};
use crate::events::{Diagnostics, Event, EventKind};
use crate::faults::Fault;
use crate::policies::Outcome;

/// Ends the hosting process.
pub trait Terminate: Send + Sync + 'static {
    /// Terminates with `code`. Production implementations do not return.
    fn terminate(&self, code: i32);
}

/// [`Terminate`] calling [`std::process::exit`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl Terminate for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Executes fatal outcomes and owns the [`ServiceState`].
pub struct ShutdownCoordinator {
    cfg: Config,
    state: StateCell,
    status: Arc<dyn StatusTracker>,
    diagnostics: Diagnostics,
    terminator: Arc<dyn Terminate>,
    last_fault: Mutex<Option<String>>,
}

impl ShutdownCoordinator {
    pub fn new(
        cfg: Config,
        status: Arc<dyn StatusTracker>,
        diagnostics: Diagnostics,
        terminator: Arc<dyn Terminate>,
    ) -> Self {
        Self {
            cfg,
            state: StateCell::new(),
            status,
            diagnostics,
            terminator,
            last_fault: Mutex::new(None),
        }
    }

    /// Current service state.
    pub fn state(&self) -> ServiceState {
        self.state.load()
    }

    /// Text of the fault that triggered the shutdown, if any.
    pub fn last_fault(&self) -> Option<String> {
        self.last_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Acts on a fatal `outcome` caused by `fault`. Never blocks.
    ///
    /// Returns `true` when this call won the transition out of `Running` and started
    /// the termination sequence; `false` for non-fatal outcomes and for faults that
    /// arrive while the service is already leaving `Running`.
    ///
    /// Non-embedded mode must be called from within a tokio runtime.
    pub fn initiate(&self, fault: &Fault, outcome: Outcome) -> bool {
        let (Some(target), Some(code)) = (
            ServiceState::for_outcome(outcome),
            outcome.exit_code(&self.cfg),
        ) else {
            return false;
        };
        let reason = fault.to_string();

        if let Err(current) = self.state.transition(ServiceState::Running, target) {
            self.diagnostics.record(
                Event::new(EventKind::ShutdownSuppressed)
                    .with_outcome(outcome)
                    .with_state(current)
                    .with_reason(reason),
            );
            return false;
        }

        *self.last_fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.clone());
        self.diagnostics.record(
            Event::new(EventKind::ShutdownInitiated)
                .with_outcome(outcome)
                .with_state(target)
                .with_reason(reason.clone()),
        );

        if self.cfg.embedded {
            self.status.update(target, &reason);
            return true;
        }

        let cfg = self.cfg.clone();
        let status = Arc::clone(&self.status);
        let diagnostics = self.diagnostics.clone();
        let terminator = Arc::clone(&self.terminator);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            if !cfg.suppress_console {
                eprintln!("fatal fault ({target}, exit code {code}): {reason}");
            }
            status.update(target, &reason);
            flush_bounded(&cfg, &diagnostics).await;
            terminator.terminate(code);
        });
        true
    }

    /// Graceful path: `Running → ClosingVoluntarily`.
    ///
    /// Returns `false` when the service already left `Running`.
    pub fn begin_close(&self, reason: &str) -> bool {
        if self
            .state
            .transition(ServiceState::Running, ServiceState::ClosingVoluntarily)
            .is_err()
        {
            return false;
        }
        self.status.update(ServiceState::ClosingVoluntarily, reason);
        self.diagnostics.record(
            Event::new(EventKind::ServiceClosing)
                .with_state(ServiceState::ClosingVoluntarily)
                .with_reason(reason),
        );
        true
    }
}

pub(crate) async fn flush_bounded(cfg: &Config, diagnostics: &Diagnostics) {
    let Some(limit) = cfg.flush_limit() else {
        return;
    };
    let reason = match tokio::time::timeout(limit, diagnostics.flush_all()).await {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err.to_string(),
        Err(_) => format!("flush exceeded {limit:?}"),
    };
    warn!(%reason, "diagnostics flush failed");
    diagnostics.record(Event::new(EventKind::FlushFailed).with_reason(reason));
}
