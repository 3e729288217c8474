mod types;
pub use types::{DeadLetteredMessage, LeasedMessage, MessageId, QueueHandle, QueueStoreError};

mod memory;
pub use memory::InMemoryQueueStore;

mod postgres;
pub use postgres::PostgresQueueStore;

use async_trait::async_trait;

/// Durable message queue the relay drains.
///
/// Delivery is at-least-once: a leased message that is neither deleted nor dead-lettered
/// becomes visible again once its visibility timeout expires. Implementations must be safe
/// for concurrent `enqueue` calls.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn enqueue(&self, body: &str) -> Result<MessageId, QueueStoreError>;

    /// Leases up to `max_count` visible messages, oldest first.
    async fn lease_batch(&self, max_count: usize) -> Result<Vec<LeasedMessage>, QueueStoreError>;

    /// Removes the message. Deleting a message that is already gone is not an error, and a
    /// delete still wins if the lease expired in the meantime since the transaction behind
    /// it has already been broadcast.
    async fn delete(&self, handle: &QueueHandle) -> Result<(), QueueStoreError>;

    /// Moves the message out of the queue for good. Ignored when `handle` no longer holds
    /// the current lease.
    async fn dead_letter(&self, handle: &QueueHandle, reason: &str) -> Result<(), QueueStoreError>;

    /// Number of messages that could be leased right now.
    async fn approximate_length(&self) -> Result<usize, QueueStoreError>;
}
