use std::sync::{Arc, Mutex};
use std::time::Duration;

use adminvisor::{
    AdminService, Authorize, CancelOutcome, CommandHandler, Config, ErrorCode, EventKind,
    EventLog, Fault, FaultKind, Identity, MemoryStatus, MemoryStore, PlanId, PlanRecord,
    PlanState, PlanStore, PlanTaskRef, Privilege, ServiceState, Subscribe, TaskError, TaskFn,
    Terminate,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingExit(Mutex<Vec<i32>>);

impl RecordingExit {
    fn codes(&self) -> Vec<i32> {
        self.0.lock().unwrap().clone()
    }
}

impl Terminate for RecordingExit {
    fn terminate(&self, code: i32) {
        self.0.lock().unwrap().push(code);
    }
}

/// Statement vocabulary for the tests:
/// - `WAIT`: runs until interrupted
/// - `IGNORE`: never observes the interrupt, finishes after 300ms
/// - `CORRUPT`: fails with an environment-corrupted fault
/// - `ASSERT`: fails with an assertion fault
/// - `CRASH`: handler itself fails with an unclassified error
struct Statements;

#[async_trait]
impl CommandHandler for Statements {
    async fn prepare(&self, statement: &str, _namespace: &str) -> Result<PlanTaskRef, Fault> {
        let task: PlanTaskRef = match statement {
            "WAIT" => TaskFn::arc("wait", |t: CancellationToken| async move {
                t.cancelled().await;
                Err(TaskError::Interrupted)
            }),
            "IGNORE" => TaskFn::arc("ignore", |_t: CancellationToken| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(())
            }),
            "CORRUPT" => TaskFn::arc("corrupt", |_t: CancellationToken| async {
                Err(TaskError::Fault(Fault::corrupted("page 17 checksum mismatch")))
            }),
            "ASSERT" => TaskFn::arc("assert", |_t: CancellationToken| async {
                Err(TaskError::Fault(Fault::assertion("replica count negative")))
            }),
            "CRASH" => return Err(Fault::Other(anyhow::anyhow!("parser state lost"))),
            other => {
                return Err(Fault::client(
                    ErrorCode::IllegalCommand,
                    format!("unknown statement {other}"),
                ));
            }
        };
        Ok(task)
    }
}

/// Only `admin` may run statements; everyone may monitor.
struct AdminOnly;

impl Authorize for AdminOnly {
    fn check(&self, identity: &Identity, privilege: Privilege) -> Result<(), Fault> {
        if privilege == Privilege::Monitor || identity.as_str() == "admin" {
            return Ok(());
        }
        Err(Fault::access_denied(Fault::client(
            ErrorCode::AccessDenied,
            format!("{identity} may not {}", privilege.as_label()),
        )))
    }
}

struct Fixture {
    svc: Arc<AdminService>,
    exits: Arc<RecordingExit>,
    status: Arc<MemoryStatus>,
    log: Arc<EventLog>,
}

fn fixture_with(cfg: Config, store: Arc<dyn PlanStore>) -> Fixture {
    let exits = Arc::new(RecordingExit::default());
    let status = Arc::new(MemoryStatus::new());
    let log = Arc::new(EventLog::new());
    let svc = AdminService::builder(
        Config {
            suppress_console: true,
            ..cfg
        },
        Arc::new(Statements),
    )
    .with_subscribers(vec![log.clone() as Arc<dyn Subscribe>])
    .with_store(store)
    .with_status(status.clone())
    .with_authorizer(Arc::new(AdminOnly))
    .with_terminator(exits.clone())
    .build();
    Fixture {
        svc,
        exits,
        status,
        log,
    }
}

fn fixture() -> Fixture {
    fixture_with(Config::default(), Arc::new(MemoryStore::new()))
}

fn admin() -> Identity {
    Identity::new("admin")
}

async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn wait_for_state(svc: &AdminService, id: PlanId, state: PlanState) {
    for _ in 0..200 {
        if svc.get_execution_status(&admin(), id).await.unwrap().state == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{id} never reached {state}");
}

#[tokio::test]
async fn interrupt_then_cancel_reports_canceled() {
    let f = fixture();
    let plan = f.svc.execute(&admin(), "WAIT", "ns").await.unwrap();
    assert_eq!(plan.state, PlanState::Running);

    let report = f
        .svc
        .interrupt_and_cancel(&admin(), plan.id, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(report.outcome, CancelOutcome::Canceled);
    assert_eq!(report.info.state, PlanState::Canceled);
    assert_eq!(f.svc.state(), ServiceState::Running);
}

#[tokio::test]
async fn zero_budget_leaves_plan_running() {
    let f = fixture();
    let plan = f.svc.execute(&admin(), "IGNORE", "ns").await.unwrap();

    let report = f
        .svc
        .interrupt_and_cancel(&admin(), plan.id, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(report.outcome, CancelOutcome::StillRunning);
    assert_eq!(report.info.state, PlanState::InterruptRequested);

    // The task ignores the interrupt and completes on its own.
    wait_for_state(&f.svc, plan.id, PlanState::Success).await;
    let again = f
        .svc
        .interrupt_and_cancel(&admin(), plan.id, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(again.outcome, CancelOutcome::AlreadyTerminal);
    assert_eq!(again.info.state, PlanState::Success);
}

#[tokio::test]
async fn cancel_twice_on_success_is_idempotent() {
    let f = fixture();
    let plan = f.svc.execute(&admin(), "IGNORE", "ns").await.unwrap();
    wait_for_state(&f.svc, plan.id, PlanState::Success).await;

    for _ in 0..2 {
        let report = f
            .svc
            .interrupt_and_cancel(&admin(), plan.id, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(report.outcome, CancelOutcome::AlreadyTerminal);
        assert_eq!(report.info.state, PlanState::Success);
    }
}

#[tokio::test]
async fn corrupted_environment_stops_without_restart() {
    let f = fixture();
    let plan = f.svc.execute(&admin(), "CORRUPT", "ns").await.unwrap();

    assert!(wait_until(|| f.exits.codes() == vec![70]).await);
    assert_eq!(f.svc.state(), ServiceState::ErrorNoRestart);
    assert_eq!(f.status.current(), ServiceState::ErrorNoRestart);
    assert!(f.svc.last_fault().unwrap().contains("checksum mismatch"));

    // New work is refused while the process goes down.
    let err = f
        .svc
        .get_execution_status(&admin(), plan.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unavailable);
}

#[tokio::test]
async fn unclassified_fault_restarts_and_hides_detail() {
    let f = fixture();
    let err = f.svc.execute(&admin(), "CRASH", "ns").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(err.kind, FaultKind::Unclassified);
    assert!(!err.message.contains("parser state"));

    assert!(wait_until(|| f.exits.codes() == vec![75]).await);
    assert_eq!(f.svc.state(), ServiceState::ErrorRestarting);
}

#[tokio::test]
async fn embedded_fatal_fault_does_not_terminate() {
    let f = fixture_with(
        Config {
            embedded: true,
            ..Config::default()
        },
        Arc::new(MemoryStore::new()),
    );
    f.svc.execute(&admin(), "CRASH", "ns").await.unwrap_err();

    assert_eq!(f.svc.state(), ServiceState::ErrorRestarting);
    assert_eq!(f.status.current(), ServiceState::ErrorRestarting);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(f.exits.codes().is_empty());
}

#[tokio::test]
async fn assertion_in_plan_is_logged_and_service_continues() {
    let f = fixture();
    let plan = f.svc.execute(&admin(), "ASSERT", "ns").await.unwrap();
    wait_for_state(&f.svc, plan.id, PlanState::Error).await;

    let info = f.svc.get_execution_status(&admin(), plan.id).await.unwrap();
    assert!(info.error.unwrap().contains("replica count"));
    assert_eq!(f.svc.state(), ServiceState::Running);

    let canceled = f
        .svc
        .interrupt_and_cancel(&admin(), plan.id, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(canceled.info.state, PlanState::Canceled);

    assert!(wait_until(|| f.log.count(EventKind::FaultLogged) == 1).await);
    f.svc.close().await.unwrap();
    assert_eq!(f.log.count(EventKind::FaultLogged), 1);
    assert!(f.exits.codes().is_empty());
}

#[tokio::test]
async fn access_denied_surfaces_cause() {
    let f = fixture();
    let err = f
        .svc
        .execute(&Identity::new("guest"), "WAIT", "ns")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AccessDenied);
    assert_eq!(err.message, "guest may not admin");
    assert_eq!(f.svc.state(), ServiceState::Running);
    assert!(f.svc.list_plans(&Identity::new("guest")).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fatal_faults_terminate_once() {
    let f = fixture();
    let mut joins = Vec::new();
    for _ in 0..6 {
        let svc = f.svc.clone();
        joins.push(tokio::spawn(async move {
            svc.execute(&admin(), "CRASH", "ns").await
        }));
    }
    for j in joins {
        let _ = j.await.unwrap();
    }

    assert!(wait_until(|| !f.exits.codes().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(f.exits.codes(), vec![75]);
}

#[tokio::test]
async fn recover_moves_stale_plans_to_interrupted() {
    let mut stale = PlanRecord::new(PlanId(5), "backup", "ns", "BACKUP");
    stale.state = PlanState::Running;
    let store = Arc::new(MemoryStore::with_records([stale]));
    let f = fixture_with(Config::default(), store.clone());

    assert_eq!(f.svc.recover().await.unwrap(), 1);
    let info = f
        .svc
        .get_execution_status(&admin(), PlanId(5))
        .await
        .unwrap();
    assert_eq!(info.state, PlanState::Interrupted);

    let report = f
        .svc
        .interrupt_and_cancel(&admin(), PlanId(5), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(report.outcome, CancelOutcome::Canceled);
    assert_eq!(
        store.load(PlanId(5)).await.unwrap().unwrap().state,
        PlanState::Canceled
    );

    let next = f.svc.execute(&admin(), "WAIT", "ns").await.unwrap();
    assert_eq!(next.id, PlanId(6));
}

#[tokio::test]
async fn close_reports_plans_that_outlive_grace() {
    let f = fixture_with(
        Config {
            grace: Duration::from_millis(20),
            ..Config::default()
        },
        Arc::new(MemoryStore::new()),
    );
    let plan = f.svc.execute(&admin(), "IGNORE", "ns").await.unwrap();

    let err = f.svc.close().await.unwrap_err();
    match err {
        adminvisor::RuntimeError::GraceExceeded { stuck, .. } => assert_eq!(stuck, vec![plan.id]),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(f.svc.state(), ServiceState::ClosingVoluntarily);
    assert_eq!(f.log.count(EventKind::GraceExceeded), 1);
}
