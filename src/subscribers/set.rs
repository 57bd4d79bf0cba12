//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers **without
//! awaiting** their processing, and supports a flush barrier.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → warn, continue
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!
//! flush()
//!     └──► Flush(ack) appended to every queue ─► subscriber.flush() ─► ack
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Per-subscriber FIFO**: each subscriber sees records in order, and a flush
//!   barrier is handled only after the records queued before it
//! - **Overflow**: record dropped for that subscriber only (warn)
//! - **Isolation**: a panicking subscriber is caught with `catch_unwind` and keeps running
//! - **Close**: queued records are drained before the workers exit
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::FlushError;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Message carried by a subscriber queue.
enum Envelope {
    Event(Arc<Event>),
    Flush(oneshot::Sender<bool>),
}

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Envelope>,
}

/// Fan-out coordinator for multiple diagnostics subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    closed: CancellationToken,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let closed = CancellationToken::new();
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Envelope>(cap);

            workers.push(tokio::spawn(Self::worker(sub, rx, closed.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self {
            channels,
            workers: Mutex::new(workers),
            closed,
        }
    }

    /// Worker loop: handles records in order until the set is closed, then drains.
    async fn worker(
        sub: Arc<dyn Subscribe>,
        mut rx: mpsc::Receiver<Envelope>,
        closed: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(env) => Self::deliver(sub.as_ref(), env).await,
                    None => break,
                },
                _ = closed.cancelled() => {
                    rx.close();
                    while let Some(env) = rx.recv().await {
                        Self::deliver(sub.as_ref(), env).await;
                    }
                    break;
                }
            }
        }
    }

    async fn deliver(sub: &dyn Subscribe, env: Envelope) {
        match env {
            Envelope::Event(ev) => {
                let fut = sub.on_event(ev.as_ref());
                if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
                    tracing::warn!(
                        subscriber = sub.name(),
                        panic = ?panic_err,
                        "subscriber panicked while handling record"
                    );
                }
            }
            Envelope::Flush(ack) => {
                let ok = AssertUnwindSafe(sub.flush()).catch_unwind().await.is_ok();
                let _ = ack.send(ok);
            }
        }
    }

    /// Fan-out one record to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the record is dropped for it
    /// and a warning is logged with the subscriber's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Envelope::Event(Arc::clone(&ev))) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, "dropped record: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, "dropped record: worker closed");
                }
            }
        }
    }

    /// Appends a flush barrier to every queue and waits for all acknowledgements.
    ///
    /// Waits for queue space if a queue is full; callers that must not hang should
    /// bound this with a timeout.
    pub async fn flush(&self) -> Result<(), FlushError> {
        let barriers = self.channels.iter().map(|channel| async move {
            let (tx, rx) = oneshot::channel();
            if channel.sender.send(Envelope::Flush(tx)).await.is_err() {
                return Err(FlushError::Closed {
                    subscriber: channel.name,
                });
            }
            match rx.await {
                Ok(true) => Ok(()),
                Ok(false) => Err(FlushError::Panicked {
                    subscriber: channel.name,
                }),
                Err(_) => Err(FlushError::Closed {
                    subscriber: channel.name,
                }),
            }
        });

        join_all(barriers).await.into_iter().collect()
    }

    /// Graceful shutdown: drain all queues and await worker completion.
    ///
    /// Idempotent; later calls return immediately.
    pub async fn close(&self) {
        self.closed.cancel();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().await.drain(..).collect();
        for h in workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
