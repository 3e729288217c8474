use serde::Serialize;

use crate::queue_store::MessageId;

/// Acknowledges that a transaction was accepted for relay. Says nothing about mining.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTransaction {
    pub message_id: MessageId,
    pub body: String,
}
