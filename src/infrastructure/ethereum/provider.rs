//! Chain client abstraction and Alloy implementations
//!
//! Only the two account reads the tracker needs: balance and nonce.

use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use anyhow::{Context, Result};

/// Provider configuration
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

/// Account reads against a node
///
/// Implementations must be shareable across the lookups of one batch group,
/// which run concurrently.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Balance in wei
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Number of transactions sent from the account
    async fn get_transaction_count(&self, address: Address) -> Result<u64>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

type FilledProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Alloy provider per transport
pub enum AlloyClient {
    Http {
        provider: FilledProvider,
        endpoint: String,
    },
    WebSocket {
        provider: FilledProvider,
        endpoint: String,
    },
    #[cfg(unix)]
    Ipc {
        provider: FilledProvider,
        endpoint: String,
    },
}

/// Create a client from configuration
pub async fn create_client(config: ProviderConfig) -> Result<Box<dyn ChainClient>> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            let provider = ProviderBuilder::new().connect_http(rpc_url);
            Ok(Box::new(AlloyClient::Http {
                provider,
                endpoint: url,
            }))
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(Box::new(AlloyClient::WebSocket {
                provider,
                endpoint: url,
            }))
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            Ok(Box::new(AlloyClient::Ipc {
                provider,
                endpoint: path.display().to_string(),
            }))
        }
    }
}

macro_rules! impl_client_method {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            AlloyClient::Http { provider, .. } => provider.$method($($arg),*).await,
            AlloyClient::WebSocket { provider, .. } => provider.$method($($arg),*).await,
            #[cfg(unix)]
            AlloyClient::Ipc { provider, .. } => provider.$method($($arg),*).await,
        }
    };
}

#[async_trait::async_trait]
impl ChainClient for AlloyClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(impl_client_method!(self, get_balance, address)?)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        Ok(impl_client_method!(self, get_transaction_count, address)?)
    }

    fn endpoint_name(&self) -> String {
        match self {
            AlloyClient::Http { endpoint, .. } => endpoint.clone(),
            AlloyClient::WebSocket { endpoint, .. } => endpoint.clone(),
            #[cfg(unix)]
            AlloyClient::Ipc { endpoint, .. } => endpoint.clone(),
        }
    }
}
