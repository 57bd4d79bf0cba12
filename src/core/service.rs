//! # AdminService: the remote administrative interface.
//!
//! Binds the components together and exposes the three remote operations plus the
//! process lifecycle:
//!
//! ```text
//! execute(identity, statement, namespace)
//!   └─ executor.execute_privileged(Admin):
//!        handler.prepare ─► registry.create ─► Approved ─► runner.launch ─► ExecutionInfo
//!
//! get_execution_status(identity, id)   ─► executor(Monitor) ─► registry.status
//! interrupt_and_cancel(identity, id, w) ─► executor(Admin)   ─► registry.request_cancel
//!
//! run_until_signal() ─► wait_for_shutdown_signal ─► close()
//! close():
//!   coordinator.begin_close          Running → ClosingVoluntarily (new work: UNAVAILABLE)
//!   admission.write (≤ grace)        executions already admitted finish launching
//!   registry.interrupt_all           running plans → InterruptRequested
//!   runner.wait_all(cfg.grace)       ├─ all joined → AllStoppedWithin
//!                                    └─ timeout    → GraceExceeded + RuntimeError
//!   flush (bounded), shut subscribers down
//! ```
//!
//! `execute` holds the admission read guard from preparation to launch and re-checks
//! the service state under it, so a plan is either launched before close interrupts
//! everything or rejected with UNAVAILABLE.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::{Identity, Privilege};
use crate::core::builder::AdminServiceBuilder;
use crate::core::config::Config;
use crate::core::executor::OperationExecutor;
use crate::core::shutdown::{ShutdownCoordinator, flush_bounded};
use crate::core::signals::wait_for_shutdown_signal;
use crate::core::state::ServiceState;
use crate::error::RuntimeError;
use crate::events::{Diagnostics, Event, EventKind};
use crate::faults::{ClientFault, ErrorCode, Fault};
use crate::plans::{CancelReport, ExecutionInfo, PlanId, PlanRegistry, PlanRunner, PlanState};
use crate::tasks::CommandHandler;

/// Administrative service core.
pub struct AdminService {
    cfg: Config,
    diagnostics: Diagnostics,
    coordinator: Arc<ShutdownCoordinator>,
    executor: Arc<OperationExecutor>,
    registry: Arc<PlanRegistry>,
    runner: PlanRunner,
    handler: Arc<dyn CommandHandler>,
    admission: RwLock<()>,
}

impl AdminService {
    /// Starts building a service that prepares plans with `handler`.
    pub fn builder(cfg: Config, handler: Arc<dyn CommandHandler>) -> AdminServiceBuilder {
        AdminServiceBuilder::new(cfg, handler)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        diagnostics: Diagnostics,
        coordinator: Arc<ShutdownCoordinator>,
        executor: Arc<OperationExecutor>,
        registry: Arc<PlanRegistry>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        let runner = PlanRunner::new(Arc::clone(&registry), Arc::clone(&executor));
        Self {
            cfg,
            diagnostics,
            coordinator,
            executor,
            registry,
            runner,
            handler,
            admission: RwLock::new(()),
        }
    }

    /// Reloads plans from the store. Call once at start-up, before serving requests.
    ///
    /// A second call fails with `ILLEGAL_STATE`; plans started by this process are
    /// never touched.
    pub async fn recover(&self) -> Result<usize, ClientFault> {
        self.executor
            .execute("recover", self.registry.restore())
            .await
    }

    /// Prepares `statement`, registers it as a plan and starts it.
    pub async fn execute(
        &self,
        identity: &Identity,
        statement: &str,
        namespace: &str,
    ) -> Result<ExecutionInfo, ClientFault> {
        self.executor
            .execute_privileged("execute", identity, Privilege::Admin, async {
                let _admitted = self.admission.read().await;
                self.ensure_running()?;
                let task = self.handler.prepare(statement, namespace).await?;
                self.ensure_running()?;
                let created = self
                    .registry
                    .create(task.name(), namespace, statement)
                    .await?;
                self.registry
                    .transition(created.id, PlanState::Approved)
                    .await?;
                self.runner.launch(created.id, task).await
            })
            .await
    }

    /// Current snapshot of a plan.
    pub async fn get_execution_status(
        &self,
        identity: &Identity,
        id: PlanId,
    ) -> Result<ExecutionInfo, ClientFault> {
        self.executor
            .execute_privileged(
                "get_execution_status",
                identity,
                Privilege::Monitor,
                self.registry.status(id),
            )
            .await
    }

    /// Interrupts a plan, waits up to `wait` for it to stop, then cancels it.
    ///
    /// `wait == 0` samples the current state only.
    pub async fn interrupt_and_cancel(
        &self,
        identity: &Identity,
        id: PlanId,
        wait: Duration,
    ) -> Result<CancelReport, ClientFault> {
        self.executor
            .execute_privileged(
                "interrupt_and_cancel",
                identity,
                Privilege::Admin,
                self.registry.request_cancel(id, wait),
            )
            .await
    }

    /// All known plans, ordered by id.
    pub async fn list_plans(&self, identity: &Identity) -> Result<Vec<ExecutionInfo>, ClientFault> {
        self.executor
            .execute_privileged("list_plans", identity, Privilege::Monitor, async {
                Ok(self.registry.list().await)
            })
            .await
    }

    /// Current service state.
    pub fn state(&self) -> ServiceState {
        self.coordinator.state()
    }

    /// Text of the fault that started a shutdown, if any.
    pub fn last_fault(&self) -> Option<String> {
        self.coordinator.last_fault()
    }

    fn ensure_running(&self) -> Result<(), Fault> {
        if self.coordinator.state() == ServiceState::Running {
            return Ok(());
        }
        Err(Fault::client(ErrorCode::Unavailable, "service is closing"))
    }

    /// Waits for a termination signal, then closes gracefully.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        let signal = wait_for_shutdown_signal().await?;
        info!(%signal, "shutdown signal received");
        self.close().await
    }

    /// Graceful close.
    ///
    /// Does nothing when the service already left `Running` (an earlier close, or a
    /// fatal fault whose own sequence is in charge).
    pub async fn close(&self) -> Result<(), RuntimeError> {
        if !self.coordinator.begin_close("graceful close requested") {
            return Ok(());
        }

        let grace = self.cfg.grace;
        if tokio::time::timeout(grace, self.admission.write())
            .await
            .is_err()
        {
            warn!(?grace, "executions still preparing at close");
        }

        let in_flight = self.registry.interrupt_all().await;
        info!(plans = in_flight.len(), "interrupted running plans");

        let stuck = self.runner.wait_all(grace).await;
        let res = if stuck.is_empty() {
            self.diagnostics
                .record(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        } else {
            let listed: Vec<String> = stuck.iter().map(ToString::to_string).collect();
            self.diagnostics.record(
                Event::new(EventKind::GraceExceeded).with_reason(listed.join(", ")),
            );
            Err(RuntimeError::GraceExceeded { grace, stuck })
        };

        flush_bounded(&self.cfg, &self.diagnostics).await;
        self.diagnostics.shutdown().await;
        res
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::core::shutdown::Terminate;
    use crate::error::TaskError;
    use crate::plans::CancelOutcome;
    use crate::tasks::{PlanTaskRef, TaskFn};

    struct NoExit;

    impl Terminate for NoExit {
        fn terminate(&self, _code: i32) {}
    }

    /// `WAIT` runs until interrupted, `DONE` finishes at once, anything else is rejected.
    struct Statements;

    #[async_trait]
    impl CommandHandler for Statements {
        async fn prepare(&self, statement: &str, _namespace: &str) -> Result<PlanTaskRef, Fault> {
            match statement {
                "WAIT" => Ok(TaskFn::arc("wait", |t: CancellationToken| async move {
                    t.cancelled().await;
                    Err(TaskError::Interrupted)
                })),
                "DONE" => Ok(TaskFn::arc("done", |_t: CancellationToken| async { Ok(()) })),
                other => Err(Fault::client(
                    ErrorCode::IllegalCommand,
                    format!("unknown statement {other}"),
                )),
            }
        }
    }

    /// Blocks in `prepare` until released.
    #[derive(Default)]
    struct Gated {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CommandHandler for Gated {
        async fn prepare(&self, _statement: &str, _namespace: &str) -> Result<PlanTaskRef, Fault> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(TaskFn::arc("gated", |t: CancellationToken| async move {
                t.cancelled().await;
                Err(TaskError::Interrupted)
            }))
        }
    }

    fn service(cfg: Config) -> Arc<AdminService> {
        service_with(cfg, Arc::new(Statements))
    }

    fn service_with(cfg: Config, handler: Arc<dyn CommandHandler>) -> Arc<AdminService> {
        AdminService::builder(
            Config {
                suppress_console: true,
                ..cfg
            },
            handler,
        )
        .with_subscribers(Vec::new())
        .with_terminator(Arc::new(NoExit))
        .build()
    }

    #[tokio::test]
    async fn test_unknown_statement_is_client_fault() {
        let svc = service(Config::default());
        let err = svc
            .execute(&Identity::new("op"), "DROP EVERYTHING", "ns")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalCommand);
        assert!(svc.list_plans(&Identity::new("op")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_then_cancel() {
        let svc = service(Config::default());
        let who = Identity::new("op");

        let info = svc.execute(&who, "WAIT", "ns").await.unwrap();
        assert_eq!(info.state, PlanState::Running);
        assert_eq!(info.name, "wait");

        let report = svc
            .interrupt_and_cancel(&who, info.id, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(report.outcome, CancelOutcome::Canceled);
        assert_eq!(
            svc.get_execution_status(&who, info.id).await.unwrap().state,
            PlanState::Canceled
        );
    }

    #[tokio::test]
    async fn test_close_interrupts_plans_and_rejects_new_work() {
        let svc = service(Config {
            grace: Duration::from_secs(2),
            ..Config::default()
        });
        let who = Identity::new("op");
        let info = svc.execute(&who, "WAIT", "ns").await.unwrap();

        svc.close().await.unwrap();
        assert_eq!(svc.state(), ServiceState::ClosingVoluntarily);

        let err = svc.execute(&who, "DONE", "ns").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);
        assert_eq!(
            svc.registry.status(info.id).await.unwrap().state,
            PlanState::Interrupted
        );

        svc.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_of_unknown_plan() {
        let svc = service(Config::default());
        let err = svc
            .get_execution_status(&Identity::new("op"), PlanId(999))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(svc.state(), ServiceState::Running);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_during_prepare_rejects_the_execution() {
        let handler = Arc::new(Gated::default());
        let svc = service_with(
            Config {
                grace: Duration::from_secs(2),
                ..Config::default()
            },
            handler.clone(),
        );

        let exec = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.execute(&Identity::new("op"), "X", "ns").await })
        };
        handler.entered.notified().await;

        let close = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.close().await })
        };
        while svc.state() == ServiceState::Running {
            tokio::task::yield_now().await;
        }
        handler.release.notify_one();

        let err = exec.await.unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);
        close.await.unwrap().unwrap();
        assert!(svc.registry.list().await.is_empty());
        assert_eq!(svc.runner.active(), 0);
    }

    #[tokio::test]
    async fn test_recover_leaves_live_plans_alone() {
        let svc = service(Config::default());
        let who = Identity::new("op");
        let info = svc.execute(&who, "WAIT", "ns").await.unwrap();

        assert_eq!(svc.recover().await.unwrap(), 0);
        assert_eq!(
            svc.get_execution_status(&who, info.id).await.unwrap().state,
            PlanState::Running
        );
        assert_eq!(
            svc.recover().await.unwrap_err().code,
            ErrorCode::IllegalState
        );

        let report = svc
            .interrupt_and_cancel(&who, info.id, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(report.outcome, CancelOutcome::Canceled);
    }
}
