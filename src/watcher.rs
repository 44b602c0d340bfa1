use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::tilt::{Session, TiltClient};

/// Publishes Tilt session snapshots to registered subscribers.
///
/// Backed by a `watch` channel holding the latest snapshot. Each subscriber
/// gets its own forwarding task, so callbacks never run under a lock and may
/// subscribe, publish or drop their own [`Subscription`].
#[derive(Clone)]
pub struct SessionWatcher {
    tx: Arc<watch::Sender<Option<Session>>>,
    subscribers: Arc<AtomicUsize>,
}

/// Handle for a registered subscriber; dropping it unsubscribes.
///
/// Once dropped, no further callback is started for it.
pub struct Subscription {
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
    subscribers: Arc<AtomicUsize>,
}

impl SessionWatcher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a callback. It is immediately called with the latest
    /// snapshot (or `None` if nothing has been seen yet), then once per
    /// change from a spawned task. Must be called inside a tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<Session>) + Send + Sync + 'static,
    {
        let mut rx = self.tx.subscribe();
        let current = rx.borrow_and_update().clone();
        callback(current);

        let active = Arc::new(AtomicBool::new(true));
        let task_active = Arc::clone(&active);
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                if !task_active.load(Ordering::Acquire) {
                    break;
                }
                callback(session);
            }
        });

        let count = self.subscribers.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(subscribers = count, "session subscriber added");

        Subscription {
            active,
            task,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }

    /// Replace the snapshot. Returns false if it was identical to the
    /// previous one and nothing was delivered.
    pub fn publish(&self, session: Option<Session>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            *current = session;
            true
        })
    }

    /// Poll Tilt forever, publishing each change.
    pub async fn run(&self, client: TiltClient, interval: Duration) {
        info!(url = client.base_url(), "watching Tilt session");
        loop {
            let session = match client.get_session().await {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(error = %e, "Tilt session unavailable");
                    None
                }
            };
            if self.publish(session) {
                debug!("session snapshot published");
            }
            tokio::time::sleep(interval).await;
        }
    }
}

impl Default for SessionWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        self.task.abort();
        let count = self.subscribers.fetch_sub(1, Ordering::AcqRel) - 1;
        debug!(subscribers = count, "session subscriber removed");
    }
}
