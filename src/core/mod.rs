//! Runtime core: request boundary, shutdown and service lifecycle.
//!
//! The public entry point is [`AdminService`], built with [`AdminServiceBuilder`].
//!
//! Internal modules:
//! - [`config`]: global settings and exit codes;
//! - [`state`]: process-wide service state and the status-tracker collaborator;
//! - [`shutdown`]: executes fatal outcomes (at most once per process);
//! - [`executor`]: per-request fault boundary;
//! - [`service`]: the administrative operations and graceful close;
//! - [`signals`]: cross-platform termination signal handling.

mod builder;
mod config;
mod executor;
mod service;
mod shutdown;
mod signals;
mod state;

pub use builder::AdminServiceBuilder;
pub use config::{Config, EXIT_NO_RESTART, EXIT_RESTART};
pub use executor::OperationExecutor;
pub(crate) use executor::panic_message;
pub use service::AdminService;
pub use shutdown::{ProcessExit, ShutdownCoordinator, Terminate};
pub use signals::{ShutdownSignal, wait_for_shutdown_signal};
pub use state::{MemoryStatus, ServiceState, StatusTracker};
