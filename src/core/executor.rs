//! # Operation executor: the per-request fault boundary.
//!
//! Every administrative request runs inside [`OperationExecutor::execute`]:
//!
//! ```text
//! execute(op, fut)
//!   ├─ service not Running ─────────────► Err(UNAVAILABLE)
//!   ├─ fut.catch_unwind().await
//!   │     Ok(Ok(v))  ─► Ok(v)
//!   │     Ok(Err(f)) ─► handle_fault(op, f)
//!   │     Err(panic) ─► handle_fault(op, Fault::Defect)
//!   └─ handle_fault:
//!        classify ─► ExitPolicy::decide ─► (fatal) ShutdownCoordinator::initiate
//!        ─► ClientFault::from_fault      (never the raw internal fault)
//! ```
//!
//! The coordinator call never blocks, so the caller always gets its response before
//! the process goes down.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::auth::{Authorize, Identity, Privilege};
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::state::ServiceState;
use crate::events::{Diagnostics, Event, EventKind};
use crate::faults::{ClientFault, Fault, FaultClassifier};
use crate::policies::ExitPolicy;

/// Wraps operations with classification, exit policy and fault normalization.
pub struct OperationExecutor {
    classifier: FaultClassifier,
    policy: ExitPolicy,
    coordinator: Arc<ShutdownCoordinator>,
    authorizer: Arc<dyn Authorize>,
    diagnostics: Diagnostics,
}

impl OperationExecutor {
    pub fn new(
        policy: ExitPolicy,
        coordinator: Arc<ShutdownCoordinator>,
        authorizer: Arc<dyn Authorize>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            classifier: FaultClassifier::new(),
            policy,
            coordinator,
            authorizer,
            diagnostics,
        }
    }

    /// Runs `fut` as `operation`.
    ///
    /// Returns the value on success, or a client-safe fault. Panics inside `fut` are
    /// caught and handled as [`Fault::Defect`].
    pub async fn execute<T, F>(&self, operation: &str, fut: F) -> Result<T, ClientFault>
    where
        F: Future<Output = Result<T, Fault>> + Send,
    {
        if self.coordinator.state() != ServiceState::Running {
            return Err(ClientFault::unavailable());
        }
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) => Err(self.handle_fault(operation, fault)),
            Err(panic) => {
                let fault = Fault::defect(panic_message(panic.as_ref()));
                Err(self.handle_fault(operation, fault))
            }
        }
    }

    /// Like [`execute`](Self::execute), after checking `identity` holds `privilege`.
    ///
    /// A denial is classified and normalized like any other fault.
    pub async fn execute_privileged<T, F>(
        &self,
        operation: &str,
        identity: &Identity,
        privilege: Privilege,
        fut: F,
    ) -> Result<T, ClientFault>
    where
        F: Future<Output = Result<T, Fault>> + Send,
    {
        let authorizer = Arc::clone(&self.authorizer);
        self.execute(operation, async move {
            authorizer.check(identity, privilege)?;
            fut.await
        })
        .await
    }

    /// Classifies `fault`, acts on the decided outcome and returns its client form.
    ///
    /// Shared with the plan runner: faults raised by background plan tasks take the
    /// same path as faults raised by requests.
    pub fn handle_fault(&self, operation: &str, fault: Fault) -> ClientFault {
        let class = self.classifier.classify(&fault);
        let outcome = self
            .policy
            .decide(operation, &fault, &class, self.coordinator.state());
        if outcome.is_fatal() {
            self.coordinator.initiate(&fault, outcome);
        }

        let client = ClientFault::from_fault(fault, class.kind);
        self.diagnostics.record(
            Event::new(EventKind::OperationFailed)
                .with_operation(operation)
                .with_fault(class.kind)
                .with_outcome(outcome)
                .with_reason(client.code.as_str()),
        );
        client
    }

    /// Current service state as seen by the coordinator.
    pub fn service_state(&self) -> ServiceState {
        self.coordinator.state()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::core::config::Config;
    use crate::core::shutdown::Terminate;
    use crate::core::state::MemoryStatus;
    use crate::faults::{ErrorCode, FaultKind};
    use crate::subscribers::{EventLog, Subscribe};

    #[derive(Default)]
    struct RecordingExit(Mutex<Vec<i32>>);

    impl Terminate for RecordingExit {
        fn terminate(&self, code: i32) {
            self.0.lock().unwrap().push(code);
        }
    }

    struct DenyAll;

    impl Authorize for DenyAll {
        fn check(&self, identity: &Identity, privilege: Privilege) -> Result<(), Fault> {
            Err(Fault::access_denied(Fault::client(
                ErrorCode::AccessDenied,
                format!("{identity} lacks {}", privilege.as_label()),
            )))
        }
    }

    struct Fixture {
        executor: OperationExecutor,
        exits: Arc<RecordingExit>,
        log: Arc<EventLog>,
        diag: Diagnostics,
    }

    fn fixture(authorizer: Arc<dyn Authorize>) -> Fixture {
        let cfg = Config {
            suppress_console: true,
            ..Config::default()
        };
        let log = Arc::new(EventLog::new());
        let diag = Diagnostics::new(vec![log.clone() as Arc<dyn Subscribe>]);
        let exits = Arc::new(RecordingExit::default());
        let coordinator = Arc::new(ShutdownCoordinator::new(
            cfg.clone(),
            Arc::new(MemoryStatus::new()),
            diag.clone(),
            exits.clone(),
        ));
        let executor = OperationExecutor::new(
            ExitPolicy::new(&cfg, diag.clone()),
            coordinator,
            authorizer,
            diag.clone(),
        );
        Fixture {
            executor,
            exits,
            log,
            diag,
        }
    }

    async fn wait_for_exit(exits: &RecordingExit) -> Vec<i32> {
        for _ in 0..100 {
            let codes = exits.0.lock().unwrap().clone();
            if !codes.is_empty() {
                return codes;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Vec::new()
    }

    #[tokio::test]
    async fn test_success_passes_value_through() {
        let f = fixture(Arc::new(crate::auth::AllowAll));
        let v = f.executor.execute("ping", async { Ok(7) }).await;
        assert_eq!(v, Ok(7));
    }

    #[tokio::test]
    async fn test_client_fault_crosses_verbatim() {
        let f = fixture(Arc::new(crate::auth::AllowAll));
        let err = f
            .executor
            .execute::<(), _>("execute", async {
                Err(Fault::client(ErrorCode::IllegalCommand, "syntax error near FROM"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IllegalCommand);
        assert_eq!(err.message, "syntax error near FROM");
        assert_eq!(f.executor.service_state(), ServiceState::Running);
    }

    #[tokio::test]
    async fn test_storage_detail_is_hidden() {
        let f = fixture(Arc::new(crate::auth::AllowAll));
        let err = f
            .executor
            .execute::<(), _>("execute", async { Err(Fault::storage("txn 81 aborted on node-3")) })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageFailure);
        assert!(!err.message.contains("node-3"));
        assert_eq!(f.executor.service_state(), ServiceState::Running);

        f.diag.flush_all().await.unwrap();
        assert_eq!(f.log.count(EventKind::FaultLogged), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_and_restarts() {
        let f = fixture(Arc::new(crate::auth::AllowAll));
        let err = f
            .executor
            .execute::<(), _>("execute", async {
                let items: Vec<u32> = Vec::new();
                if items.is_empty() {
                    panic!("index out of bounds");
                }
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.kind, FaultKind::Unclassified);
        assert!(!err.message.contains("index out of bounds"));
        assert_eq!(f.executor.service_state(), ServiceState::ErrorRestarting);
        assert_eq!(wait_for_exit(&f.exits).await, vec![75]);
    }

    #[tokio::test]
    async fn test_rejects_work_after_fatal_fault() {
        let f = fixture(Arc::new(crate::auth::AllowAll));
        let _ = f
            .executor
            .execute::<(), _>("execute", async { Err(Fault::corrupted("bad page")) })
            .await;
        assert_eq!(f.executor.service_state(), ServiceState::ErrorNoRestart);

        let err = f.executor.execute("ping", async { Ok(1) }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);
        assert_eq!(wait_for_exit(&f.exits).await, vec![70]);
    }

    #[tokio::test]
    async fn test_denied_identity_sees_cause() {
        let f = fixture(Arc::new(DenyAll));
        let err = f
            .executor
            .execute_privileged("execute", &Identity::new("bob"), Privilege::Admin, async {
                Ok(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessDenied);
        assert_eq!(err.kind, FaultKind::ClientAccessDenied);
        assert_eq!(err.message, "bob lacks admin");
        assert_eq!(f.executor.service_state(), ServiceState::Running);
    }

    #[tokio::test]
    async fn test_command_fault_with_defect_cause_restarts() {
        let f = fixture(Arc::new(crate::auth::AllowAll));
        let err = f
            .executor
            .execute::<(), _>("execute", async {
                Err(Fault::command(ErrorCode::PlanFailure, "plan aborted")
                    .with_cause(Fault::defect("null reference")))
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanFailure);
        assert_eq!(err.message, "plan aborted");
        assert_eq!(f.executor.service_state(), ServiceState::ErrorRestarting);
    }

    #[test]
    fn test_panic_message_variants() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "panic: boom");
        let s: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(s.as_ref()), "panic: bang");
        let s: Box<dyn Any + Send> = Box::new(5_u8);
        assert_eq!(panic_message(s.as_ref()), "panic with non-string payload");
    }
}
