//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the admin core.
//!
//! Config is used in three places:
//! 1. **ExitPolicy**: whether severe fault records are written
//! 2. **ShutdownCoordinator**: embedded mode, console output, flush bound, exit codes
//! 3. **AdminService::close**: grace period for plan workers
//!
//! ## Sentinel values
//! - `flush_timeout = 0s` → do not wait for diagnostics before terminating
//! - `grace = 0s` → do not wait for plan workers on close

use std::time::Duration;

/// Exit code asking the process manager to restart the service (`EX_TEMPFAIL`).
pub const EXIT_RESTART: i32 = 75;

/// Exit code telling the process manager not to restart the service (`EX_SOFTWARE`).
pub const EXIT_NO_RESTART: i32 = 70;

/// Global configuration for the admin core.
///
/// ## Field semantics
/// - `embedded`: service runs inside a host process that owns the process lifecycle
/// - `suppress_fault_log`: operator flag silencing the exit policy's severe records
/// - `suppress_console`: do not print the fatal fault to stderr before exiting
/// - `flush_timeout`: bound on the diagnostics flush before termination (`0s` = skip)
/// - `grace`: bound on waiting for plan workers during graceful close (`0s` = no wait)
/// - `restart_exit_code` / `no_restart_exit_code`: codes handed to the terminator
#[derive(Clone, Debug)]
pub struct Config {
    /// Running in-process inside a host; the coordinator never terminates the process.
    pub embedded: bool,

    /// Do not write severe records for LogOnly/Restart/NoRestart outcomes.
    pub suppress_fault_log: bool,

    /// Do not print the triggering fault to the operator console before exiting.
    pub suppress_console: bool,

    /// Maximum time spent flushing diagnostics before terminating.
    ///
    /// Exceeding it does not stop termination; shutdown never hangs on diagnostics.
    pub flush_timeout: Duration,

    /// Maximum time to wait for plan workers during graceful close.
    pub grace: Duration,

    /// Exit code for [`Outcome::Restart`](crate::Outcome::Restart).
    pub restart_exit_code: i32,

    /// Exit code for [`Outcome::NoRestart`](crate::Outcome::NoRestart).
    pub no_restart_exit_code: i32,
}

impl Config {
    /// Returns the flush bound as an `Option`.
    ///
    /// - `None` → skip flushing
    /// - `Some(d)` → flush for at most `d`
    #[inline]
    pub fn flush_limit(&self) -> Option<Duration> {
        if self.flush_timeout == Duration::ZERO {
            None
        } else {
            Some(self.flush_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - stand-alone process, fault logging and console output enabled
    /// - `flush_timeout = 5s`
    /// - `grace = 30s`
    /// - exit codes [`EXIT_RESTART`] / [`EXIT_NO_RESTART`]
    fn default() -> Self {
        Self {
            embedded: false,
            suppress_fault_log: false,
            suppress_console: false,
            flush_timeout: Duration::from_secs(5),
            grace: Duration::from_secs(30),
            restart_exit_code: EXIT_RESTART,
            no_restart_exit_code: EXIT_NO_RESTART,
        }
    }
}
