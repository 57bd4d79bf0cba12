use std::sync::Arc;

use crate::auth::{AllowAll, Authorize};
use crate::core::{
    config::Config,
    executor::OperationExecutor,
    service::AdminService,
    shutdown::{ProcessExit, ShutdownCoordinator, Terminate},
    state::{MemoryStatus, StatusTracker},
};
use crate::events::Diagnostics;
use crate::plans::{MemoryStore, PlanRegistry, PlanStore};
use crate::policies::ExitPolicy;
use crate::subscribers::{LogWriter, Subscribe};
use crate::tasks::CommandHandler;

/// Builder for constructing an [`AdminService`] with its collaborators.
///
/// Defaults: [`LogWriter`] diagnostics, [`MemoryStore`], [`MemoryStatus`],
/// [`AllowAll`], [`ProcessExit`].
pub struct AdminServiceBuilder {
    cfg: Config,
    handler: Arc<dyn CommandHandler>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    store: Arc<dyn PlanStore>,
    status: Arc<dyn StatusTracker>,
    authorizer: Arc<dyn Authorize>,
    terminator: Arc<dyn Terminate>,
}

impl AdminServiceBuilder {
    /// Creates a new builder with the given configuration and command handler.
    pub fn new(cfg: Config, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            cfg,
            handler,
            subscribers: vec![Arc::new(LogWriter::new())],
            store: Arc::new(MemoryStore::new()),
            status: Arc::new(MemoryStatus::new()),
            authorizer: Arc::new(AllowAll),
            terminator: Arc::new(ProcessExit),
        }
    }

    /// Sets diagnostics subscribers, replacing the default [`LogWriter`].
    ///
    /// Subscribers receive records through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the durable plan store.
    pub fn with_store(mut self, store: Arc<dyn PlanStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the external service-status tracker.
    pub fn with_status(mut self, status: Arc<dyn StatusTracker>) -> Self {
        self.status = status;
        self
    }

    /// Sets the authorization checker.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorize>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Sets what ends the process on a fatal outcome.
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminate>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Builds the service.
    ///
    /// Spawns one diagnostics worker per subscriber, so it must be called from
    /// within a tokio runtime.
    pub fn build(self) -> Arc<AdminService> {
        let diagnostics = Diagnostics::new(self.subscribers);
        let coordinator = Arc::new(ShutdownCoordinator::new(
            self.cfg.clone(),
            self.status,
            diagnostics.clone(),
            self.terminator,
        ));
        let executor = Arc::new(OperationExecutor::new(
            ExitPolicy::new(&self.cfg, diagnostics.clone()),
            Arc::clone(&coordinator),
            self.authorizer,
            diagnostics.clone(),
        ));
        let registry = Arc::new(PlanRegistry::new(self.store, diagnostics.clone()));

        Arc::new(AdminService::new_internal(
            self.cfg,
            diagnostics,
            coordinator,
            executor,
            registry,
            self.handler,
        ))
    }
}
