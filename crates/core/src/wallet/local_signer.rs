use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    primitives::{Bytes, TxKind, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};

use crate::{
    gas::GasLimit,
    shared::common_types::{ChainId, EvmAddress},
    transaction::types::{RawTransaction, TransactionData, TransactionHash, TransactionNonce},
    wallet::{TransactionSigner, WalletError},
};

/// Gas is free on the permissioned ledger the gateway writes to.
const GAS_PRICE: u128 = 0;

pub struct LocalTransactionSigner {
    signer: PrivateKeySigner,
    chain_id: ChainId,
}

impl LocalTransactionSigner {
    pub fn new(signer: PrivateKeySigner, chain_id: ChainId) -> Self {
        LocalTransactionSigner { signer, chain_id }
    }

    pub fn from_private_key(private_key: &str, chain_id: ChainId) -> Result<Self, WalletError> {
        let signer = private_key.trim().parse::<PrivateKeySigner>()?;
        Ok(Self::new(signer, chain_id))
    }

    fn build_transaction(
        &self,
        nonce: TransactionNonce,
        destination: &EvmAddress,
        data: &TransactionData,
        gas_limit: GasLimit,
    ) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id.u64()),
            nonce: nonce.into_inner(),
            gas_price: GAS_PRICE,
            gas_limit: gas_limit.into_inner(),
            to: TxKind::Call(destination.into_address()),
            value: U256::ZERO,
            input: data.clone().into_inner(),
        }
    }
}

impl TransactionSigner for LocalTransactionSigner {
    fn address(&self) -> EvmAddress {
        EvmAddress::new(self.signer.address())
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn sign(
        &self,
        nonce: TransactionNonce,
        destination: &EvmAddress,
        data: &TransactionData,
        gas_limit: GasLimit,
    ) -> Result<RawTransaction, WalletError> {
        let transaction = self.build_transaction(nonce, destination, data, gas_limit);

        let signature = self.signer.sign_hash_sync(&transaction.signature_hash())?;
        let signed = transaction.into_signed(signature);
        let hash = TransactionHash::from_alloy_hash(signed.hash());

        let envelope = TxEnvelope::from(signed);
        Ok(RawTransaction::new(Bytes::from(envelope.encoded_2718()), hash, self.address(), nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{consensus::Transaction, eips::eip2718::Decodable2718, primitives::address};

    // anvil account 0
    const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn signer() -> LocalTransactionSigner {
        LocalTransactionSigner::from_private_key(PRIVATE_KEY, ChainId::new(1337)).unwrap()
    }

    fn destination() -> EvmAddress {
        EvmAddress::new(address!("46988BA8250E009DCC5DF543D78E2277E2AA900B"))
    }

    #[test]
    fn test_address_matches_private_key() {
        assert_eq!(
            signer().address(),
            EvmAddress::new(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"))
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let data: TransactionData = "0xdeadbeef".parse().unwrap();
        let first =
            signer().sign(TransactionNonce::new(7), &destination(), &data, GasLimit::new(90_000));
        let second =
            signer().sign(TransactionNonce::new(7), &destination(), &data, GasLimit::new(90_000));

        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn test_signed_transaction_carries_inputs_and_zero_gas_price() {
        let data: TransactionData = "0xdeadbeef".parse().unwrap();
        let raw = signer()
            .sign(TransactionNonce::new(12), &destination(), &data, GasLimit::new(90_000))
            .unwrap();

        assert!(raw.hex().starts_with("0x"));

        let envelope = TxEnvelope::decode_2718(&mut raw.bytes().as_ref()).unwrap();
        assert_eq!(envelope.nonce(), 12);
        assert_eq!(envelope.gas_limit(), 90_000);
        assert_eq!(envelope.gas_price(), Some(0));
        assert_eq!(envelope.chain_id(), Some(1337));
        assert_eq!(envelope.to(), Some(destination().into_address()));
        assert_eq!(envelope.input().as_ref(), data.into_inner().as_ref());
        assert_eq!(TransactionHash::from_alloy_hash(envelope.tx_hash()), raw.hash());
        assert_eq!(raw.nonce(), TransactionNonce::new(12));
        assert_eq!(*raw.sender(), signer().address());
    }

    #[test]
    fn test_different_nonce_produces_different_transaction() {
        let data = TransactionData::empty();
        let a = signer().sign(TransactionNonce::new(1), &destination(), &data, GasLimit::new(1));
        let b = signer().sign(TransactionNonce::new(2), &destination(), &data, GasLimit::new(1));
        assert_ne!(a.unwrap().hash(), b.unwrap().hash());
    }
}
