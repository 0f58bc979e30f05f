//! Batched, rate-limited account lookups
//!
//! Targets are processed in fixed-size groups. Lookups inside a group run
//! concurrently; the next group starts only after every lookup of the
//! current one has settled and the inter-group delay has elapsed. The
//! cancel token is consulted before each group, so a stop request lets the
//! in-flight group finish and issues nothing further.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;

use crate::domain::{parse_address, QueryTarget, RowId};
use crate::infrastructure::ethereum::{format_balance, ChainClient};

pub const DEFAULT_GROUP_SIZE: usize = 5;
pub const DEFAULT_GROUP_DELAY: Duration = Duration::from_secs(1);

/// Explicit stop request shared between the caller and a running batch
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub group_size: usize,
    pub delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            delay: DEFAULT_GROUP_DELAY,
        }
    }
}

/// Fetched figures, already formatted for the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub balance: String,
    pub tx_count: String,
}

/// Why one row's lookup failed; the row shows the failure sentinel either way
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    InvalidAddress,
    RateLimited(String),
    Network(String),
    Provider(String),
}

impl LookupFailure {
    pub fn classify(err: &anyhow::Error) -> Self {
        let detail = format!("{:#}", err);
        let lower = detail.to_lowercase();
        if ["rate limit", "429", "too many requests"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            LookupFailure::RateLimited(detail)
        } else if ["network", "connect", "timed out", "timeout", "dns", "transport"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            LookupFailure::Network(detail)
        } else {
            LookupFailure::Provider(detail)
        }
    }

    /// Short user-facing explanation
    pub fn message(&self) -> &'static str {
        match self {
            LookupFailure::InvalidAddress => "Enter a valid address first",
            LookupFailure::RateLimited(_) => "Query rate too high, try again later",
            LookupFailure::Network(_) => "Network connection failed, check your network",
            LookupFailure::Provider(_) => "Query failed, try again later",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub eta_secs: u64,
}

impl Progress {
    /// Remaining time extrapolated from the mean time per completed lookup
    pub fn estimate(completed: usize, total: usize, elapsed: Duration) -> Self {
        let eta_secs = if completed == 0 {
            0
        } else {
            let per_row = elapsed.as_secs_f64() / completed as f64;
            (total.saturating_sub(completed) as f64 * per_row).round() as u64
        };
        Self {
            completed,
            total,
            eta_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryUpdate {
    Row {
        id: RowId,
        outcome: Result<AccountInfo, LookupFailure>,
    },
    Progress(Progress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

pub struct BatchQuerier<C: ?Sized> {
    client: Arc<C>,
    settings: BatchSettings,
}

impl<C: ChainClient + ?Sized> BatchQuerier<C> {
    pub fn new(client: Arc<C>, settings: BatchSettings) -> Self {
        Self { client, settings }
    }

    /// Run every target through `lookup`, reporting each completion and
    /// the running progress to `on_update`.
    pub async fn run<F>(
        &self,
        targets: &[QueryTarget],
        cancel: &CancelToken,
        mut on_update: F,
    ) -> BatchOutcome
    where
        F: FnMut(QueryUpdate),
    {
        let start = Instant::now();
        let total = targets.len();
        let group_size = self.settings.group_size.max(1);
        let group_count = total.div_ceil(group_size);
        let mut completed = 0;
        let mut failed = 0;
        let mut cancelled = false;

        for (index, group) in targets.chunks(group_size).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let mut pending: FuturesUnordered<_> = group
                .iter()
                .map(|target| async move { (target.id, self.lookup(&target.address).await) })
                .collect();

            while let Some((id, outcome)) = pending.next().await {
                completed += 1;
                if outcome.is_err() {
                    failed += 1;
                }
                on_update(QueryUpdate::Row { id, outcome });
                on_update(QueryUpdate::Progress(Progress::estimate(
                    completed,
                    total,
                    start.elapsed(),
                )));
            }

            if index + 1 < group_count && !cancel.is_cancelled() {
                tokio::time::sleep(self.settings.delay).await;
            }
        }

        let outcome = BatchOutcome {
            completed,
            failed,
            total,
            cancelled,
            elapsed: start.elapsed(),
        };
        log::info!(
            "batch finished: {}/{} completed, {} failed, cancelled={}",
            completed,
            total,
            failed,
            cancelled
        );
        outcome
    }

    /// Balance and nonce for one address, requested together
    pub async fn lookup(&self, address: &str) -> Result<AccountInfo, LookupFailure> {
        let Some(parsed) = parse_address(address) else {
            return Err(LookupFailure::InvalidAddress);
        };

        let result = tokio::try_join!(
            self.client.get_balance(parsed),
            self.client.get_transaction_count(parsed)
        );
        match result {
            Ok((balance, tx_count)) => {
                log::debug!("lookup {} ok", address);
                Ok(AccountInfo {
                    balance: format_balance(balance),
                    tx_count: tx_count.to_string(),
                })
            }
            Err(err) => {
                log::warn!("lookup {} failed: {:#}", address, err);
                Err(LookupFailure::classify(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_estimate() {
        assert_eq!(Progress::estimate(0, 10, Duration::from_secs(5)).eta_secs, 0);
        assert_eq!(Progress::estimate(5, 10, Duration::from_secs(5)).eta_secs, 5);
        assert_eq!(Progress::estimate(10, 10, Duration::from_secs(9)).eta_secs, 0);
        assert_eq!(Progress::estimate(3, 10, Duration::from_secs(2)).eta_secs, 5);
    }

    #[test]
    fn test_classify_failures() {
        let rate = anyhow::anyhow!("HTTP error 429 Too Many Requests");
        assert!(matches!(
            LookupFailure::classify(&rate),
            LookupFailure::RateLimited(_)
        ));
        let net = anyhow::anyhow!("error sending request: connection refused");
        assert!(matches!(LookupFailure::classify(&net), LookupFailure::Network(_)));
        let other = anyhow::anyhow!("execution reverted");
        assert!(matches!(LookupFailure::classify(&other), LookupFailure::Provider(_)));
    }
}
