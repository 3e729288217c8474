use alloy::signers::local::{coins_bip39::English, MnemonicBuilder};

use crate::{
    shared::common_types::ChainId,
    wallet::{LocalTransactionSigner, WalletError},
    yaml::SigningKey,
};

/// Builds the relay signer from the `signing_key` section of the yaml.
///
/// # Arguments
/// * `signing_key` - Exactly one of `raw` or `mnemonic` must be set
/// * `chain_id` - Chain the signed transactions are bound to (EIP-155)
pub fn load_signer_from_signing_key(
    signing_key: &SigningKey,
    chain_id: ChainId,
) -> Result<LocalTransactionSigner, WalletError> {
    signing_key.validate().map_err(|message| WalletError::ConfigurationError { message })?;

    if let Some(raw) = &signing_key.raw {
        return LocalTransactionSigner::from_private_key(&raw.private_key, chain_id);
    }

    if let Some(mnemonic) = &signing_key.mnemonic {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(mnemonic.phrase.trim())
            .index(mnemonic.index.unwrap_or(0))?
            .build()?;

        return Ok(LocalTransactionSigner::new(signer, chain_id));
    }

    Err(WalletError::NoSigningKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        shared::common_types::EvmAddress,
        wallet::TransactionSigner,
        yaml::{MnemonicSigningKey, RawSigningKey},
    };
    use alloy::primitives::address;

    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

    #[test]
    fn test_loads_raw_private_key() {
        let signing_key = SigningKey {
            raw: Some(RawSigningKey {
                private_key: "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                    .to_string(),
            }),
            mnemonic: None,
        };

        let signer = load_signer_from_signing_key(&signing_key, ChainId::new(1)).unwrap();
        assert_eq!(
            signer.address(),
            EvmAddress::new(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"))
        );
    }

    #[test]
    fn test_loads_mnemonic_at_index() {
        let signing_key = SigningKey {
            raw: None,
            mnemonic: Some(MnemonicSigningKey { phrase: TEST_MNEMONIC.to_string(), index: Some(1) }),
        };

        let signer = load_signer_from_signing_key(&signing_key, ChainId::new(1)).unwrap();
        assert_eq!(
            signer.address(),
            EvmAddress::new(address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"))
        );
    }

    #[test]
    fn test_rejects_missing_key() {
        let signing_key = SigningKey { raw: None, mnemonic: None };
        assert!(load_signer_from_signing_key(&signing_key, ChainId::new(1)).is_err());
    }
}
