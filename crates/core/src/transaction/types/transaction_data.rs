use std::{fmt::Display, str::FromStr};

use alloy::hex::FromHex;
use alloy::{hex, primitives::Bytes};
use serde::{Deserialize, Serialize};

/// Opaque ABI encoded call payload. Serialized as a `0x` prefixed hex string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TransactionData(Bytes);

impl TransactionData {
    pub fn new(data: Bytes) -> Self {
        Self(data)
    }

    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    pub fn into_inner(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn hex(&self) -> String {
        hex::encode_prefixed(&self.0)
    }

    pub fn raw_hex(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("TransactionData string is empty".to_string());
        }

        let Some(hex_part) = s.strip_prefix("0x") else {
            return Err("TransactionData must start with '0x'".to_string());
        };

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("TransactionData must contain only valid hexadecimal digits".to_string());
        }

        let bytes = Vec::from_hex(hex_part).map_err(|e| format!("Invalid hex string: {e}"))?;

        Ok(Self(Bytes::from(bytes)))
    }
}

impl FromStr for TransactionData {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionData::raw_hex(s)
    }
}

impl Default for TransactionData {
    fn default() -> Self {
        TransactionData::empty()
    }
}

impl Display for TransactionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl From<TransactionData> for Bytes {
    fn from(data: TransactionData) -> Self {
        data.0
    }
}

impl From<Bytes> for TransactionData {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl From<Vec<u8>> for TransactionData {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_hex_requires_prefix_and_hex_digits() {
        assert!(TransactionData::raw_hex("").is_err());
        assert!(TransactionData::raw_hex("abcd").is_err());
        assert!(TransactionData::raw_hex("0xzz").is_err());
        assert!(TransactionData::raw_hex("0xabc").is_err());

        let data = TransactionData::raw_hex("0xa9059cbb").unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data.hex(), "0xa9059cbb");
    }

    #[test]
    fn test_serializes_as_prefixed_hex_string() {
        let data: TransactionData = "0x0102".parse().unwrap();
        assert_eq!(serde_json::to_string(&data).unwrap(), "\"0x0102\"");
    }
}
