//! # Example: cancel_plan
//!
//! Demonstrates the interrupt-and-cancel protocol of a long-running plan.
//!
//! Shows how to:
//! - Wire an [`AdminService`] with a [`CommandHandler`] and the tracing-backed [`LogWriter`]
//! - Start a plan that honors interrupts only at segment boundaries
//! - Cancel it with a zero wait budget (sample only), then with a real budget
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► svc.execute("COMPACT sales")           plan RUNNING
//!   ├─► interrupt_and_cancel(wait = 0)         INTERRUPT_REQUESTED, still_running
//!   │     └─► worker finishes its segment, observes the token, returns Interrupted
//!   ├─► interrupt_and_cancel(wait = 2s)        INTERRUPTED → CANCELED
//!   └─► svc.close()                            graceful close, diagnostics flushed
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example cancel_plan
//! ```

use std::{sync::Arc, time::Duration};

use adminvisor::{
    AdminService, CommandHandler, Config, ErrorCode, Fault, Identity, LogWriter, PlanTaskRef,
    Subscribe, TaskError, TaskFn,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Accepts `COMPACT <table>`; the plan compacts ten segments of 200ms each.
struct Compactor;

#[async_trait]
impl CommandHandler for Compactor {
    async fn prepare(&self, statement: &str, _namespace: &str) -> Result<PlanTaskRef, Fault> {
        let Some(table) = statement.strip_prefix("COMPACT ") else {
            return Err(Fault::client(
                ErrorCode::IllegalCommand,
                format!("unsupported statement: {statement}"),
            ));
        };
        let name = format!("compact-{table}");
        Ok(TaskFn::arc(name, |interrupt: CancellationToken| async move {
            for segment in 1..=10u32 {
                println!("[plan] compacting segment {segment}/10");
                tokio::time::sleep(Duration::from_millis(200)).await;
                if interrupt.is_cancelled() {
                    println!("[plan] interrupt observed after segment {segment}");
                    return Err(TaskError::Interrupted);
                }
            }
            Ok(())
        }))
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Configure runtime
    let cfg = Config {
        grace: Duration::from_secs(5),
        ..Config::default()
    };

    // 2. Diagnostics go to tracing
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    // 3. Build the service
    let svc = AdminService::builder(cfg, Arc::new(Compactor))
        .with_subscribers(subs)
        .build();
    let who = Identity::new("operator");

    // 4. Start a plan
    let plan = svc.execute(&who, "COMPACT sales", "prod").await?;
    println!("[admin] started {} ({})", plan.id, plan.state);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 5. Budget zero: interrupt is requested, nothing is waited for
    let sample = svc
        .interrupt_and_cancel(&who, plan.id, Duration::ZERO)
        .await?;
    println!(
        "[admin] sample: {} ({})",
        sample.info.state,
        sample.outcome.as_label()
    );

    // 6. Real budget: waits for the worker to stop, then cancels
    let report = svc
        .interrupt_and_cancel(&who, plan.id, Duration::from_secs(2))
        .await?;
    println!(
        "[admin] cancel: {} ({})",
        report.info.state,
        report.outcome.as_label()
    );

    // 7. Unknown statements are client faults; the service keeps running
    if let Err(err) = svc.execute(&who, "VACUUM sales", "prod").await {
        println!("[admin] rejected: {err}");
    }

    svc.close().await?;
    println!("[admin] closed ({})", svc.state());
    Ok(())
}
