//! Runtime infrastructure - Tokio runtime bridge for async operations

pub mod batch;
mod bridge;
mod worker;

pub use batch::{
    AccountInfo, BatchOutcome, BatchQuerier, BatchSettings, CancelToken, LookupFailure, Progress,
    QueryUpdate,
};
pub use bridge::{PriceSettings, RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerSettings};
