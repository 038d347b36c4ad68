use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use chrono::NaiveDate;
use log::{error, info};
use tokio::sync::oneshot;

pub mod commands;
mod grouping;
mod slot;

pub use grouping::group_by_date;

use crate::error::StoreError;
use crate::models::{DateGroup, HistoryEntry};
use slot::HistorySlot;

type StoreTask = Box<dyn FnOnce(&mut HistorySlot) + Send + 'static>;

enum StoreCommand {
    Execute(StoreTask),
    Shutdown,
}

struct HistoryStoreInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for HistoryStoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(StoreCommand::Shutdown) {
                error!("Failed to send shutdown to history worker: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join history worker: {join_err:?}");
            }
        }
    }
}

/// Durable, ordered collection of prediction records (newest first), backed
/// by a single JSON document. All reads and mutations are serialized through
/// one worker thread that owns the slot, so two callers can never interleave
/// a read-modify-write and lose each other's effect.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<HistoryStoreInner>,
    slot_path: Arc<PathBuf>,
}

impl HistoryStore {
    pub fn new(slot_path: PathBuf) -> Result<Self, StoreError> {
        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = slot_path.clone();

        let worker = thread::Builder::new()
            .name("pomegrade-history".into())
            .spawn(move || {
                let mut slot = match HistorySlot::open(path_for_thread) {
                    Ok(slot) => slot,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                if ready_tx.send(Ok(())).is_err() {
                    error!("History store receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Execute(task) => task(&mut slot),
                        StoreCommand::Shutdown => break,
                    }
                }

                info!("History worker shutting down");
            })
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| StoreError::Unavailable("history worker exited before signaling readiness".into()))??;

        info!("History store initialized at {}", slot_path.display());

        Ok(Self {
            inner: Arc::new(HistoryStoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            slot_path: Arc::new(slot_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.slot_path.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut HistorySlot) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = StoreCommand::Execute(Box::new(move |slot| {
            let result = task(slot);
            if reply_tx.send(result).is_err() {
                error!("History caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|_| StoreError::Unavailable("history worker is gone".into()))?;

        reply_rx
            .await
            .map_err(|_| StoreError::Unavailable("history worker terminated unexpectedly".into()))?
    }

    /// Prepends the entry; the write is fully persisted before this returns.
    pub async fn append(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.execute(move |slot| slot.append(entry)).await
    }

    /// All entries in current persisted order. An empty store is a valid
    /// state, not an error.
    pub async fn load_all(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        self.execute(|slot| Ok(slot.entries().to_vec())).await
    }

    /// Date-grouped projection of the current entries.
    pub async fn grouped(&self) -> Result<Vec<DateGroup>, StoreError> {
        self.execute(|slot| Ok(group_by_date(slot.entries()))).await
    }

    pub async fn delete_entry(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.execute(move |slot| slot.delete_entry(&id)).await
    }

    pub async fn delete_group(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.execute(move |slot| slot.delete_group(date)).await
    }
}
