use alloy::{hex, primitives::Bytes};

use super::{TransactionHash, TransactionNonce};
use crate::shared::common_types::EvmAddress;

/// A signed, EIP-2718 encoded transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    bytes: Bytes,
    hash: TransactionHash,
    sender: EvmAddress,
    nonce: TransactionNonce,
}

impl RawTransaction {
    pub fn new(
        bytes: Bytes,
        hash: TransactionHash,
        sender: EvmAddress,
        nonce: TransactionNonce,
    ) -> Self {
        RawTransaction { bytes, hash, sender, nonce }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Hash the chain will assign to this transaction once accepted.
    pub fn hash(&self) -> TransactionHash {
        self.hash
    }

    pub fn sender(&self) -> &EvmAddress {
        &self.sender
    }

    pub fn nonce(&self) -> TransactionNonce {
        self.nonce
    }

    pub fn hex(&self) -> String {
        hex::encode_prefixed(&self.bytes)
    }
}
