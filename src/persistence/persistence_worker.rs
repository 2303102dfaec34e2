use super::write_panel_state;
use crate::panel::PanelConfig;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const STATE_CHANNEL_CAPACITY: usize = 32;

/// Background task writing panel state snapshots to disk
///
/// Snapshots that queue up while a write is running are coalesced; only the newest
/// one is written. The last pending snapshot is flushed on shutdown.
pub struct PersistenceWorker {
    tx: Sender<PanelConfig>,
    worker_handle: JoinHandle<()>,
}

impl PersistenceWorker {
    pub fn spawn(path: PathBuf, cancel: CancellationToken) -> Self {
        let (tx, rx) = channel::<PanelConfig>(STATE_CHANNEL_CAPACITY);
        let worker_handle = tokio::spawn(run_worker(path, rx, cancel));
        Self { tx, worker_handle }
    }

    pub fn get_sender(&self) -> Sender<PanelConfig> {
        self.tx.clone()
    }

    /// Drops the own sender and waits for the worker to finish.
    pub async fn join(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!("Persistence worker panicked: {}", e);
        }
    }
}

fn newest(first: PanelConfig, rx: &mut Receiver<PanelConfig>) -> PanelConfig {
    let mut latest = first;
    let mut skipped = 0usize;
    while let Ok(next) = rx.try_recv() {
        latest = next;
        skipped += 1;
    }
    if skipped > 0 {
        debug!("Coalesced {} panel state snapshots", skipped);
    }
    latest
}

async fn write(path: &Path, config: &PanelConfig) {
    if let Err(e) = write_panel_state(path, config).await {
        error!("Failed to persist panel state: {}", e);
    }
}

async fn run_worker(path: PathBuf, mut rx: Receiver<PanelConfig>, cancel: CancellationToken) {
    info!("Persistence worker writing to {}", path.display());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown signal received for persistence worker");
                if let Ok(first) = rx.try_recv() {
                    let latest = newest(first, &mut rx);
                    write(&path, &latest).await;
                }
                break;
            }

            snapshot = rx.recv() => {
                match snapshot {
                    Some(first) => {
                        let latest = newest(first, &mut rx);
                        write(&path, &latest).await;
                    }
                    None => {
                        debug!("State channel closed");
                        break;
                    }
                }
            }
        }
    }
}
