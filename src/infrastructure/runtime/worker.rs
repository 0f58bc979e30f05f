//! Async worker - runs in Tokio runtime and handles RPC operations

use std::sync::mpsc::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::domain::QueryTarget;
use crate::infrastructure::ethereum::{create_client, ChainClient, ProviderConfig};
use crate::infrastructure::price::PriceFeed;
use crate::infrastructure::runtime::batch::{
    BatchOutcome, BatchQuerier, BatchSettings, CancelToken, LookupFailure, QueryUpdate,
};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, WorkerSettings};

/// The batch currently holding the query slot
struct RunningBatch {
    cancel: CancelToken,
    /// Set just before `QueryFinished` goes out
    reported: Arc<AtomicBool>,
    _handle: JoinHandle<()>,
}

impl RunningBatch {
    /// Once the app has been told the batch ended, it may start the next one
    fn is_active(&self) -> bool {
        !self.reported.load(Ordering::SeqCst)
    }
}

/// Run the async worker loop
pub async fn run_async_worker(
    settings: WorkerSettings,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let mut client: Option<Arc<dyn ChainClient>> = None;
    let mut batch: Option<RunningBatch> = None;

    let price_feed = match PriceFeed::new(
        &settings.price.url,
        &settings.price.asset,
        &settings.price.fiat,
    ) {
        Ok(feed) => Some(Arc::new(feed)),
        Err(err) => {
            log::warn!("price feed disabled: {:#}", err);
            None
        }
    };

    let mut tick = interval(Duration::from_millis(50));

    loop {
        if client.is_none() {
            match connect(settings.provider.clone(), &evt_tx).await {
                Ok(connected) => client = Some(connected),
                Err(err) => {
                    let _ = evt_tx.send(RuntimeEvent::Error {
                        message: format!(
                            "Connection failed ({}): {:#}",
                            settings.provider.display(),
                            err
                        ),
                    });
                }
            }
        }

        // Process commands (non-blocking)
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                RuntimeCommand::Shutdown => {
                    if let Some(running) = batch.take() {
                        running.cancel.cancel();
                    }
                    return Ok(());
                }

                RuntimeCommand::QueryRows { targets } => {
                    if batch.as_ref().is_some_and(RunningBatch::is_active) {
                        let _ = evt_tx.send(RuntimeEvent::QueryRejected {
                            reason: "A query is already running".to_string(),
                        });
                        continue;
                    }
                    match client {
                        Some(ref c) => {
                            batch = Some(spawn_batch(
                                Arc::clone(c),
                                settings.batch,
                                targets,
                                evt_tx.clone(),
                            ));
                        }
                        None => fail_unconnected(&targets, &evt_tx),
                    }
                }

                RuntimeCommand::QueryRow { target } => match client {
                    Some(ref c) => {
                        let querier = BatchQuerier::new(Arc::clone(c), settings.batch);
                        let evt_tx = evt_tx.clone();
                        tokio::spawn(async move {
                            let outcome = querier.lookup(&target.address).await;
                            let _ = evt_tx.send(RuntimeEvent::RowRefreshed {
                                id: target.id,
                                outcome,
                            });
                        });
                    }
                    None => {
                        let _ = evt_tx.send(RuntimeEvent::RowRefreshed {
                            id: target.id,
                            outcome: Err(not_connected()),
                        });
                    }
                },

                RuntimeCommand::StopQuery => {
                    if let Some(ref running) = batch {
                        log::info!("stop requested");
                        running.cancel.cancel();
                    }
                }

                RuntimeCommand::FetchPrice => {
                    let evt_tx = evt_tx.clone();
                    let feed = price_feed.clone();
                    tokio::spawn(async move {
                        let price = match feed {
                            Some(feed) => feed.price_in_fiat().await,
                            None => None,
                        };
                        let _ = evt_tx.send(RuntimeEvent::PriceReady { price });
                    });
                }
            }
        }

        if client.is_none() {
            tokio::time::sleep(Duration::from_millis(900)).await;
        } else {
            tick.tick().await;
        }
    }
}

async fn connect(
    config: ProviderConfig,
    evt_tx: &Sender<RuntimeEvent>,
) -> Result<Arc<dyn ChainClient>> {
    let client: Arc<dyn ChainClient> = Arc::from(create_client(config).await?);
    log::info!("connected to {}", client.endpoint_name());
    let _ = evt_tx.send(RuntimeEvent::Connected {
        endpoint: client.endpoint_name(),
    });
    Ok(client)
}

fn spawn_batch(
    client: Arc<dyn ChainClient>,
    settings: BatchSettings,
    targets: Vec<QueryTarget>,
    evt_tx: Sender<RuntimeEvent>,
) -> RunningBatch {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let reported = Arc::new(AtomicBool::new(false));
    let done = Arc::clone(&reported);
    log::info!("batch started: {} rows", targets.len());

    let handle = tokio::spawn(async move {
        let querier = BatchQuerier::new(client, settings);
        let updates = evt_tx.clone();
        let outcome = querier
            .run(&targets, &token, move |update| {
                let event = match update {
                    QueryUpdate::Row { id, outcome } => RuntimeEvent::RowQueried { id, outcome },
                    QueryUpdate::Progress(progress) => RuntimeEvent::Progress(progress),
                };
                let _ = updates.send(event);
            })
            .await;
        done.store(true, Ordering::SeqCst);
        let _ = evt_tx.send(RuntimeEvent::QueryFinished(outcome));
    });

    RunningBatch {
        cancel,
        reported,
        _handle: handle,
    }
}

fn not_connected() -> LookupFailure {
    LookupFailure::Network("not connected to a node".to_string())
}

/// Settle every row of a batch that could not start, so none stays loading
fn fail_unconnected(targets: &[QueryTarget], evt_tx: &Sender<RuntimeEvent>) {
    for target in targets {
        let _ = evt_tx.send(RuntimeEvent::RowQueried {
            id: target.id,
            outcome: Err(not_connected()),
        });
    }
    let _ = evt_tx.send(RuntimeEvent::QueryFinished(BatchOutcome {
        completed: targets.len(),
        failed: targets.len(),
        total: targets.len(),
        cancelled: false,
        elapsed: Duration::ZERO,
    }));
}
