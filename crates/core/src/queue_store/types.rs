use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::postgres::PostgresError;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        MessageId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        MessageId(id)
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one lease of one message. Only meaningful for the drain cycle that leased it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct QueueHandle {
    pub message_id: MessageId,
    pub lease_token: Uuid,
}

impl QueueHandle {
    pub fn new(message_id: MessageId, lease_token: Uuid) -> Self {
        QueueHandle { message_id, lease_token }
    }
}

impl Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.message_id, self.lease_token)
    }
}

#[derive(Debug, Clone)]
pub struct LeasedMessage {
    pub handle: QueueHandle,
    pub body: String,
    /// Times the store has handed this message out, this lease included.
    pub receive_count: u32,
}

#[derive(Debug, Clone)]
pub struct DeadLetteredMessage {
    pub message_id: MessageId,
    pub body: String,
    pub receive_count: u32,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum QueueStoreError {
    #[error("Queue store database error: {0}")]
    Postgres(#[from] PostgresError),

    #[error("Queue store returned an invalid row: {0}")]
    InvalidRow(String),

    #[error("Queue store is unavailable: {0}")]
    Unavailable(String),
}
