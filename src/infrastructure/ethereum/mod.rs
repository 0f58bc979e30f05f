//! Ethereum infrastructure - Alloy client implementations

mod provider;
pub mod types;

pub use provider::{create_client, AlloyClient, ChainClient, ProviderConfig};
pub use types::{format_balance, NATIVE_SYMBOL};
