//! # Plan runner: one worker per started plan.
//!
//! ```text
//! launch(id, task)
//!   registry.start(id)        Approved → Running, returns interrupt token
//!   spawn worker:
//!     task.run(token).catch_unwind()      panic → TaskError::Fault(Defect)
//!     registry.finish(id, &result)        Success | Interrupted | Error
//!     TaskError::Fault(f) → executor.handle_fault("plan:<name>", f)
//! ```
//!
//! Faults raised by plan tasks go through the same classification and exit policy
//! as request faults. Workers are tracked so graceful close can wait for them.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::core::{OperationExecutor, panic_message};
use crate::error::TaskError;
use crate::faults::Fault;
use crate::plans::record::{ExecutionInfo, PlanId};
use crate::plans::registry::PlanRegistry;
use crate::tasks::PlanTaskRef;

/// Spawns and tracks plan workers.
pub struct PlanRunner {
    registry: Arc<PlanRegistry>,
    executor: Arc<OperationExecutor>,
    workers: Mutex<HashMap<PlanId, JoinHandle<()>>>,
}

impl PlanRunner {
    pub fn new(registry: Arc<PlanRegistry>, executor: Arc<OperationExecutor>) -> Self {
        Self {
            registry,
            executor,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Starts `task` for an `Approved` plan and returns the `Running` snapshot.
    pub async fn launch(&self, id: PlanId, task: PlanTaskRef) -> Result<ExecutionInfo, Fault> {
        let token = self.registry.start(id).await?;
        let info = self.registry.status(id).await?;

        let registry = Arc::clone(&self.registry);
        let executor = Arc::clone(&self.executor);
        let handle = tokio::spawn(async move {
            let operation = format!("plan:{}", task.name());
            let result = AssertUnwindSafe(task.run(token))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(TaskError::Fault(Fault::defect(panic_message(panic.as_ref()))))
                });

            if let Err(fault) = registry.finish(id, &result).await {
                warn!(plan = %id, %fault, "failed to record plan result");
                executor.handle_fault(&operation, fault);
            }
            if let Err(TaskError::Fault(fault)) = result {
                executor.handle_fault(&operation, fault);
            }
        });

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        workers.retain(|_, h| !h.is_finished());
        workers.insert(id, handle);
        Ok(info)
    }

    /// Number of workers that have not finished yet.
    pub fn active(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Waits up to `grace` for every worker; returns the plans still running.
    ///
    /// Workers that outlive `grace` are left running.
    pub async fn wait_all(&self, grace: Duration) -> Vec<PlanId> {
        let workers: Vec<(PlanId, JoinHandle<()>)> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        let deadline = tokio::time::Instant::now() + grace;
        let mut stuck = Vec::new();
        for (id, handle) in workers {
            if tokio::time::timeout_at(deadline, handle).await.is_err() {
                stuck.push(id);
            }
        }
        stuck.sort();
        stuck
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::auth::AllowAll;
    use crate::core::{Config, MemoryStatus, ShutdownCoordinator, ServiceState, Terminate};
    use crate::events::Diagnostics;
    use crate::faults::ErrorCode;
    use crate::plans::state::PlanState;
    use crate::plans::store::MemoryStore;
    use crate::policies::ExitPolicy;
    use crate::tasks::TaskFn;

    struct NoExit;

    impl Terminate for NoExit {
        fn terminate(&self, _code: i32) {}
    }

    fn runner() -> (PlanRunner, Arc<PlanRegistry>, Arc<OperationExecutor>) {
        let cfg = Config {
            suppress_console: true,
            ..Config::default()
        };
        let diag = Diagnostics::disabled();
        let coordinator = Arc::new(ShutdownCoordinator::new(
            cfg.clone(),
            Arc::new(MemoryStatus::new()),
            diag.clone(),
            Arc::new(NoExit),
        ));
        let executor = Arc::new(OperationExecutor::new(
            ExitPolicy::new(&cfg, diag.clone()),
            coordinator,
            Arc::new(AllowAll),
            diag.clone(),
        ));
        let registry = Arc::new(PlanRegistry::new(Arc::new(MemoryStore::new()), diag));
        (
            PlanRunner::new(registry.clone(), executor.clone()),
            registry,
            executor,
        )
    }

    async fn approved(registry: &PlanRegistry) -> PlanId {
        let id = registry.create("t", "ns", "S").await.unwrap().id;
        registry.transition(id, PlanState::Approved).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_successful_task_reaches_success() {
        let (runner, registry, _) = runner();
        let id = approved(&registry).await;

        let info = runner
            .launch(id, TaskFn::arc("ok", |_t: CancellationToken| async { Ok(()) }))
            .await
            .unwrap();
        assert_eq!(info.state, PlanState::Running);

        assert!(runner.wait_all(Duration::from_secs(1)).await.is_empty());
        assert_eq!(registry.status(id).await.unwrap().state, PlanState::Success);
    }

    #[tokio::test]
    async fn test_interrupted_task_reaches_interrupted() {
        let (runner, registry, _) = runner();
        let id = approved(&registry).await;

        runner
            .launch(
                id,
                TaskFn::arc("loop", |t: CancellationToken| async move {
                    t.cancelled().await;
                    Err(TaskError::Interrupted)
                }),
            )
            .await
            .unwrap();
        registry.interrupt(id).await.unwrap();

        assert!(runner.wait_all(Duration::from_secs(1)).await.is_empty());
        assert_eq!(registry.status(id).await.unwrap().state, PlanState::Interrupted);
    }

    #[tokio::test]
    async fn test_task_fault_goes_through_exit_policy() {
        let (runner, registry, executor) = runner();
        let id = approved(&registry).await;

        runner
            .launch(
                id,
                TaskFn::arc("corrupt", |_t: CancellationToken| async {
                    Err(TaskError::Fault(Fault::corrupted("segment checksum")))
                }),
            )
            .await
            .unwrap();
        runner.wait_all(Duration::from_secs(1)).await;

        let info = registry.status(id).await.unwrap();
        assert_eq!(info.state, PlanState::Error);
        assert_eq!(executor.service_state(), ServiceState::ErrorNoRestart);
    }

    #[tokio::test]
    async fn test_panicking_task_is_a_defect() {
        let (runner, registry, executor) = runner();
        let id = approved(&registry).await;

        runner
            .launch(
                id,
                TaskFn::arc("panics", |_t: CancellationToken| async {
                    let parts: Vec<&str> = Vec::new();
                    if parts.is_empty() {
                        panic!("unreachable branch");
                    }
                    Ok(())
                }),
            )
            .await
            .unwrap();
        runner.wait_all(Duration::from_secs(1)).await;

        assert_eq!(registry.status(id).await.unwrap().state, PlanState::Error);
        assert_eq!(executor.service_state(), ServiceState::ErrorRestarting);
    }

    #[tokio::test]
    async fn test_launch_requires_approved_plan() {
        let (runner, registry, _) = runner();
        let id = registry.create("t", "ns", "S").await.unwrap().id;

        let err = runner
            .launch(id, TaskFn::arc("x", |_t: CancellationToken| async { Ok(()) }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Fault::Command {
                code: ErrorCode::IllegalState,
                ..
            }
        ));
        assert_eq!(runner.active(), 0);
    }

    #[tokio::test]
    async fn test_wait_all_reports_stuck_workers() {
        let (runner, registry, _) = runner();
        let id = approved(&registry).await;
        let release = Arc::new(AtomicBool::new(false));

        let flag = release.clone();
        runner
            .launch(
                id,
                TaskFn::arc("stubborn", move |_t: CancellationToken| {
                    let flag = flag.clone();
                    async move {
                        while !flag.load(Ordering::SeqCst) {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                        }
                        Ok(())
                    }
                }),
            )
            .await
            .unwrap();

        assert_eq!(runner.wait_all(Duration::from_millis(30)).await, vec![id]);
        release.store(true, Ordering::SeqCst);
    }
}
