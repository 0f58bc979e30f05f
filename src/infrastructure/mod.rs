//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based chain client implementations
//! - The fiat price feed
//! - Clipboard access
//! - Tokio runtime bridge and the batch querier it drives

pub mod clipboard;
pub mod ethereum;
pub mod price;
pub mod runtime;

pub use runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
