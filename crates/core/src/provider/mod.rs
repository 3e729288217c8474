mod evm_provider;
mod layer_extensions;

pub use evm_provider::{create_retry_client, EvmChainClient, RelayerProvider, RetryClientError};

use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use thiserror::Error;

use crate::{
    shared::common_types::EvmAddress,
    transaction::types::{RawTransaction, TransactionHash, TransactionNonce},
};

#[derive(Error, Debug)]
pub enum ChainClientError {
    #[error("Provider error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),

    #[error("No provider urls configured")]
    NoProviders,

    #[error("http provider cant be created for {0}: {1}")]
    ProviderCantBeCreated(String, String),
}

/// Remote chain the relay writes to.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Next usable nonce for `address`, counting transactions still in the mempool.
    async fn next_nonce(&self, address: &EvmAddress) -> Result<TransactionNonce, ChainClientError>;

    async fn broadcast(
        &self,
        raw_transaction: &RawTransaction,
    ) -> Result<TransactionHash, ChainClientError>;
}
