use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{TransactionData, TransactionMetadata};
use crate::{gas::GasLimit, shared::common_types::EvmAddress};

#[derive(Error, Debug)]
pub enum TransactionRequestError {
    #[error("Could not serialize transaction request: {0}")]
    Serialize(serde_json::Error),

    #[error("Malformed transaction request message body: {0}")]
    Malformed(serde_json::Error),
}

/// The queued message body. Field names on the wire are fixed so messages written by
/// older gateway versions stay readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRequest {
    pub data: TransactionData,

    #[serde(rename = "gasLimit")]
    pub gas_limit: GasLimit,

    #[serde(rename = "contractAddress")]
    pub destination: EvmAddress,

    #[serde(rename = "txMetaData", default)]
    pub metadata: TransactionMetadata,

    /// Failed broadcast attempts seen by the relay. Never reset.
    #[serde(rename = "txProcessedCount", default)]
    pub attempt_count: u32,
}

impl TransactionRequest {
    pub fn new(
        destination: EvmAddress,
        data: TransactionData,
        gas_limit: GasLimit,
        metadata: TransactionMetadata,
    ) -> Self {
        TransactionRequest { data, gas_limit, destination, metadata, attempt_count: 0 }
    }

    pub fn to_message_body(&self) -> Result<String, TransactionRequestError> {
        serde_json::to_string(self).map_err(TransactionRequestError::Serialize)
    }

    pub fn from_message_body(body: &str) -> Result<Self, TransactionRequestError> {
        serde_json::from_str(body).map_err(TransactionRequestError::Malformed)
    }

    pub fn record_failed_attempt(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }

    /// Name of the originating business method, for log lines.
    pub fn method_name(&self) -> &str {
        self.metadata.method().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    fn request() -> TransactionRequest {
        TransactionRequest::new(
            EvmAddress::new(address!("46988BA8250E009DCC5DF543D78E2277E2AA900B")),
            "0xdeadbeef".parse().unwrap(),
            GasLimit::new(250_000),
            TransactionMetadata::new(json!({ "method": "recordConsent", "consentId": "c-1" })),
        )
    }

    #[test]
    fn test_message_body_uses_queue_wire_field_names() {
        let body = request().to_message_body().unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["data"], "0xdeadbeef");
        assert_eq!(value["gasLimit"], 250_000);
        assert_eq!(
            value["contractAddress"].as_str().unwrap().to_lowercase(),
            "0x46988ba8250e009dcc5df543d78e2277e2aa900b"
        );
        assert_eq!(value["txMetaData"]["method"], "recordConsent");
        assert_eq!(value["txProcessedCount"], 0);
    }

    #[test]
    fn test_reads_body_without_processed_count_or_metadata() {
        let body = r#"{
            "data": "0x01",
            "gasLimit": 21000,
            "contractAddress": "0x46988ba8250e009dcc5df543d78e2277e2aa900b",
            "somethingElse": true
        }"#;

        let parsed = TransactionRequest::from_message_body(body).unwrap();
        assert_eq!(parsed.attempt_count, 0);
        assert_eq!(parsed.gas_limit, GasLimit::new(21000));
        assert_eq!(parsed.method_name(), "unknown");
    }

    #[test]
    fn test_malformed_body_is_reported() {
        let result = TransactionRequest::from_message_body("{\"data\": 12}");
        assert!(matches!(result, Err(TransactionRequestError::Malformed(_))));
    }

    #[test]
    fn test_failed_attempts_only_increase() {
        let mut request = request();
        assert_eq!(request.record_failed_attempt(), 1);
        assert_eq!(request.record_failed_attempt(), 2);
        assert_eq!(request.method_name(), "recordConsent");
    }
}
