use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes the business operation that produced a transaction request
/// (method name, consent or document identifiers...). Only ever logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct TransactionMetadata(Value);

impl TransactionMetadata {
    pub fn new(value: Value) -> Self {
        TransactionMetadata(value)
    }

    pub fn method(&self) -> Option<&str> {
        self.0.get("method").and_then(Value::as_str)
    }
}

impl Display for TransactionMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Value> for TransactionMetadata {
    fn from(value: Value) -> Self {
        TransactionMetadata(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_is_read_from_metadata_object() {
        let metadata =
            TransactionMetadata::new(json!({ "method": "grantConsent", "consentId": 4 }));
        assert_eq!(metadata.method(), Some("grantConsent"));
        assert_eq!(TransactionMetadata::new(json!("grantConsent")).method(), None);
        assert_eq!(TransactionMetadata::default().method(), None);
    }
}
