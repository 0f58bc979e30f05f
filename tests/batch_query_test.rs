//! Batch querier behaviour against a scripted chain client

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use anyhow::{bail, Result};
use tokio::time::Instant;

use tally::domain::{parse_address, QueryTarget, RowId};
use tally::infrastructure::ethereum::ChainClient;
use tally::infrastructure::runtime::{
    BatchQuerier, BatchSettings, CancelToken, LookupFailure, QueryUpdate,
};

const ONE_ETH: u64 = 1_000_000_000_000_000_000;

/// Answers every balance with 2 ETH and every nonce with 7, except for
/// addresses listed in `failing`
#[derive(Default)]
struct ScriptedClient {
    failing: HashSet<Address>,
    balance_calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedClient {
    fn failing(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().filter_map(|a| parse_address(a)).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChainClient for ScriptedClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.failing.contains(&address) {
            bail!("error sending request: connection refused");
        }
        Ok(U256::from(2u64) * U256::from(ONE_ETH))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        if self.failing.contains(&address) {
            bail!("error sending request: connection refused");
        }
        Ok(7)
    }

    fn endpoint_name(&self) -> String {
        "scripted".to_string()
    }
}

fn address(n: usize) -> String {
    format!("0x{:040x}", n + 1)
}

fn targets(count: usize) -> Vec<QueryTarget> {
    (0..count)
        .map(|n| QueryTarget {
            id: RowId(n as u64 + 1),
            address: address(n),
        })
        .collect()
}

fn settings() -> BatchSettings {
    BatchSettings {
        group_size: 5,
        delay: Duration::from_secs(1),
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_target_reported_once() {
    let failing = address(3);
    let client = Arc::new(ScriptedClient::failing(&[&failing]));
    let querier = BatchQuerier::new(client.clone(), settings());
    let cancel = CancelToken::new();
    let targets = targets(12);

    let mut seen = Vec::new();
    let mut last_progress = None;
    let outcome = querier
        .run(&targets, &cancel, |update| match update {
            QueryUpdate::Row { id, outcome } => seen.push((id, outcome)),
            QueryUpdate::Progress(progress) => last_progress = Some(progress),
        })
        .await;

    assert_eq!(outcome.total, 12);
    assert_eq!(outcome.completed, 12);
    assert_eq!(outcome.failed, 1);
    assert!(!outcome.cancelled);
    assert_eq!(client.calls(), 12);

    let ids: HashSet<RowId> = seen.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids.len(), 12);

    let (_, failed) = seen.iter().find(|(id, _)| *id == RowId(4)).unwrap();
    assert!(matches!(failed, Err(LookupFailure::Network(_))));
    let (_, ok) = seen.iter().find(|(id, _)| *id == RowId(1)).unwrap();
    let info = ok.as_ref().unwrap();
    assert_eq!(info.balance, "2.0000");
    assert_eq!(info.tx_count, "7");

    let progress = last_progress.unwrap();
    assert_eq!(progress.completed, 12);
    assert_eq!(progress.total, 12);
    assert_eq!(progress.eta_secs, 0);
}

#[tokio::test(start_paused = true)]
async fn test_groups_wait_for_delay() {
    let client = Arc::new(ScriptedClient::default());
    let querier = BatchQuerier::new(client.clone(), settings());
    let cancel = CancelToken::new();

    let outcome = querier.run(&targets(11), &cancel, |_| {}).await;
    assert_eq!(outcome.completed, 11);

    let times = client.call_times.lock().unwrap().clone();
    assert_eq!(times.len(), 11);
    // Lookups within a group start together
    assert_eq!(times[0], times[4]);
    assert!(times[5].duration_since(times[4]) >= Duration::from_secs(1));
    assert!(times[10].duration_since(times[9]) >= Duration::from_secs(1));
    assert!(outcome.elapsed >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_first_group() {
    let client = Arc::new(ScriptedClient::default());
    let querier = BatchQuerier::new(client.clone(), settings());
    let cancel = CancelToken::new();
    let stopper = cancel.clone();

    let start = Instant::now();
    let outcome = querier
        .run(&targets(15), &cancel, |update| {
            if let QueryUpdate::Progress(progress) = update {
                if progress.completed == 5 {
                    stopper.cancel();
                }
            }
        })
        .await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.completed, 5);
    assert_eq!(outcome.total, 15);
    assert_eq!(client.calls(), 5);
    // No trailing delay once stopped
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_issues_nothing() {
    let client = Arc::new(ScriptedClient::default());
    let querier = BatchQuerier::new(client.clone(), settings());
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = querier.run(&targets(3), &cancel, |_| {}).await;
    assert!(outcome.cancelled);
    assert_eq!(outcome.completed, 0);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_lookup_rejects_malformed_address() {
    let client = Arc::new(ScriptedClient::default());
    let querier = BatchQuerier::new(client.clone(), settings());

    let result = querier.lookup("0x1234").await;
    assert_eq!(result, Err(LookupFailure::InvalidAddress));
    assert_eq!(client.calls(), 0);
}
