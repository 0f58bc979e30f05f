//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI never awaits. It pushes commands down one std channel and drains
//! events from the other on every tick.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tokio::runtime::Runtime;

use crate::domain::{QueryTarget, RowId};
use crate::infrastructure::ethereum::ProviderConfig;
use crate::infrastructure::runtime::batch::{
    AccountInfo, BatchOutcome, BatchSettings, LookupFailure, Progress,
};
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Start a batch over the given rows; refused while another batch runs
    QueryRows { targets: Vec<QueryTarget> },
    /// Refresh one row outside the batch slot
    QueryRow { target: QueryTarget },
    /// Stop the running batch after its in-flight group settles
    StopQuery,
    /// Fetch the fiat price of the native asset
    FetchPrice,
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Node client is ready
    Connected { endpoint: String },
    /// One row of the running batch settled
    RowQueried {
        id: RowId,
        outcome: Result<AccountInfo, LookupFailure>,
    },
    /// A single-row refresh settled
    RowRefreshed {
        id: RowId,
        outcome: Result<AccountInfo, LookupFailure>,
    },
    /// Batch progress after each completion
    Progress(Progress),
    /// The batch ended, either exhausted or stopped
    QueryFinished(BatchOutcome),
    /// A batch request was refused before any row was looked up
    QueryRejected { reason: String },
    /// Fiat price, `None` when the feed was unavailable
    PriceReady { price: Option<f64> },
    /// Error occurred
    Error { message: String },
}

/// Where the price feed lives and what it is asked for
#[derive(Debug, Clone)]
pub struct PriceSettings {
    pub url: String,
    pub asset: String,
    pub fiat: String,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub provider: ProviderConfig,
    pub batch: BatchSettings,
    pub price: PriceSettings,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    pub fn new(settings: WorkerSettings) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("tally-worker".to_string())
            .spawn(move || {
                let rt = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Failed to create Tokio runtime: {}", err),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) = run_async_worker(settings, cmd_rx, evt_tx.clone()).await {
                        log::error!("worker exited: {:#}", err);
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
