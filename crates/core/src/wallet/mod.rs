mod local_signer;
pub use local_signer::LocalTransactionSigner;

mod signing_key_providers;
pub use signing_key_providers::load_signer_from_signing_key;

use thiserror::Error;

use crate::{
    gas::GasLimit,
    shared::common_types::{ChainId, EvmAddress},
    transaction::types::{RawTransaction, TransactionData, TransactionNonce},
};

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Signing key error: {0}")]
    SigningKeyError(#[from] alloy::signers::local::LocalSignerError),

    #[error("Generic signer error: {0}")]
    GenericSignerError(String),

    #[error("Invalid wallet configuration: {message}")]
    ConfigurationError { message: String },

    #[error("No signing key configured")]
    NoSigningKey,
}

impl From<alloy::signers::Error> for WalletError {
    /// Converts an Alloy signer error into a WalletError.
    fn from(error: alloy::signers::Error) -> Self {
        WalletError::GenericSignerError(format!("Alloy signer error: {}", error))
    }
}

/// Holds the relay account key and turns a nonce plus call into a signed raw transaction.
///
/// Implementations must be pure: no I/O, and identical inputs must always produce identical
/// output so a transaction re-signed after a restart is byte-for-byte the same.
pub trait TransactionSigner: Send + Sync {
    /// Address of the signing account, used for the nonce lookup.
    fn address(&self) -> EvmAddress;

    fn chain_id(&self) -> ChainId;

    fn sign(
        &self,
        nonce: TransactionNonce,
        destination: &EvmAddress,
        data: &TransactionData,
        gas_limit: GasLimit,
    ) -> Result<RawTransaction, WalletError>;
}
