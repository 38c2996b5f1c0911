use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use storage::KeyValueStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::notify::{Notifier, NotifyLevel};

pub const AUTOSAVE_KEY: &str = "strongman_autoSave_v1";
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

const AUTOSAVE_FAILED: &str = "Błąd auto-zapisu.";

enum Command {
    Save(Value),
    Flush(oneshot::Sender<()>),
    Cancel,
}

/// Debounced background writer for the autosave record.
///
/// Each scheduled snapshot replaces the pending one and restarts the delay,
/// so a burst of edits ends in a single write of the latest state. Writes run
/// on their own task and never block the caller.
pub struct Autosaver {
    tx: mpsc::UnboundedSender<Command>,
    worker: JoinHandle<()>,
}

impl Autosaver {
    /// Starts the writer task. Must be called inside a tokio runtime.
    pub fn spawn(kv: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(rx, kv, notifier, delay));
        Self { tx, worker }
    }

    pub fn schedule(&self, snapshot: Value) {
        if self.tx.send(Command::Save(snapshot)).is_err() {
            error!("Autosave worker is gone, snapshot dropped");
        }
    }

    /// Drops a pending write, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }

    /// Writes the pending snapshot now and waits for it.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    kv: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    delay: Duration,
) {
    let mut pending: Option<Value> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = rx.recv() => command,
                _ = tokio::time::sleep(delay) => {
                    if let Some(snapshot) = pending.take() {
                        write(kv.as_ref(), notifier.as_ref(), snapshot).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Save(snapshot)) => pending = Some(snapshot),
            Some(Command::Cancel) => pending = None,
            Some(Command::Flush(done)) => {
                if let Some(snapshot) = pending.take() {
                    write(kv.as_ref(), notifier.as_ref(), snapshot).await;
                }
                let _ = done.send(());
            }
            None => {
                if let Some(snapshot) = pending.take() {
                    write(kv.as_ref(), notifier.as_ref(), snapshot).await;
                }
                break;
            }
        }
    }
}

async fn write(kv: &dyn KeyValueStore, notifier: &dyn Notifier, snapshot: Value) {
    match kv.put(AUTOSAVE_KEY, snapshot).await {
        Ok(()) => debug!("Autosave written"),
        Err(e) => {
            error!("Autosave failed: {}", e);
            notifier.notify(AUTOSAVE_FAILED, NotifyLevel::Error, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::TracingNotifier;
    use serde_json::json;
    use storage::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_written_once_with_latest_value() {
        let kv = Arc::new(MemoryStore::new());
        let saver = Autosaver::spawn(kv.clone(), Arc::new(TracingNotifier), DEFAULT_AUTOSAVE_DELAY);

        for n in 1..=5 {
            saver.schedule(json!({ "eventNumber": n }));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(kv.get(AUTOSAVE_KEY).await.unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(kv.get(AUTOSAVE_KEY).await.unwrap(), Some(json!({ "eventNumber": 5 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let kv = Arc::new(MemoryStore::new());
        let saver = Autosaver::spawn(kv.clone(), Arc::new(TracingNotifier), DEFAULT_AUTOSAVE_DELAY);

        saver.schedule(json!({ "eventNumber": 3 }));
        saver.flush().await;
        assert_eq!(kv.get(AUTOSAVE_KEY).await.unwrap(), Some(json!({ "eventNumber": 3 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_write() {
        let kv = Arc::new(MemoryStore::new());
        let saver = Autosaver::spawn(kv.clone(), Arc::new(TracingNotifier), DEFAULT_AUTOSAVE_DELAY);

        saver.schedule(json!({ "eventNumber": 3 }));
        saver.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        saver.flush().await;
        assert!(kv.get(AUTOSAVE_KEY).await.unwrap().is_none());
    }
}
