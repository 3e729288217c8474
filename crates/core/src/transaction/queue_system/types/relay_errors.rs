use thiserror::Error;

use crate::{
    provider::ChainClientError,
    queue_store::QueueStoreError,
    transaction::{encoder::EncodeContractCallError, types::TransactionRequestError},
    wallet::WalletError,
};

#[derive(Error, Debug)]
pub enum SendTransactionError {
    #[error("Could not encode contract call: {0}")]
    CouldNotEncode(#[from] EncodeContractCallError),

    #[error("{0}")]
    InvalidRequest(#[from] TransactionRequestError),

    #[error("Could not enqueue transaction: {0}")]
    CouldNotEnqueue(#[from] QueueStoreError),
}

/// Why a single leased message was not broadcast. Every variant leaves the message in the
/// queue except `Malformed`, which can never succeed.
#[derive(Error, Debug)]
pub enum RelayMessageError {
    #[error("{0}")]
    Malformed(TransactionRequestError),

    #[error("Could not fetch nonce: {0}")]
    Nonce(ChainClientError),

    #[error("Could not sign transaction: {0}")]
    Signing(#[from] WalletError),

    #[error("Broadcast failed: {0}")]
    Broadcast(ChainClientError),
}
