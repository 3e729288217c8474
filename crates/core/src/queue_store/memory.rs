use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    DeadLetteredMessage, LeasedMessage, MessageId, QueueHandle, QueueStore, QueueStoreError,
};

struct StoredMessage {
    id: MessageId,
    body: String,
    visible_at: Instant,
    receive_count: u32,
    lease_token: Option<Uuid>,
}

#[derive(Default)]
struct InMemoryQueueState {
    messages: VecDeque<StoredMessage>,
    dead_letters: VecDeque<DeadLetteredMessage>,
}

/// Dead letters kept in memory, the oldest is dropped beyond this.
const DEAD_LETTER_CAPACITY: usize = 1_000;

/// Process local queue store. Nothing survives a restart, so it is meant for tests and
/// single node development setups.
pub struct InMemoryQueueStore {
    state: Mutex<InMemoryQueueState>,
    visibility_timeout: Duration,
    dead_letter_capacity: usize,
}

impl InMemoryQueueStore {
    pub fn new(visibility_timeout: Duration) -> Self {
        InMemoryQueueStore {
            state: Mutex::new(InMemoryQueueState::default()),
            visibility_timeout,
            dead_letter_capacity: DEAD_LETTER_CAPACITY,
        }
    }

    /// All messages still in the queue, leased or not.
    pub async fn total_length(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    pub async fn contains(&self, message_id: &MessageId) -> bool {
        self.state.lock().await.messages.iter().any(|message| message.id == *message_id)
    }

    /// Most recent dead letters, oldest first.
    pub async fn dead_letters(&self) -> Vec<DeadLetteredMessage> {
        self.state.lock().await.dead_letters.iter().cloned().collect()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn enqueue(&self, body: &str) -> Result<MessageId, QueueStoreError> {
        let id = MessageId::new();
        let mut state = self.state.lock().await;
        state.messages.push_back(StoredMessage {
            id,
            body: body.to_string(),
            visible_at: Instant::now(),
            receive_count: 0,
            lease_token: None,
        });
        Ok(id)
    }

    async fn lease_batch(&self, max_count: usize) -> Result<Vec<LeasedMessage>, QueueStoreError> {
        let now = Instant::now();
        let lease_token = Uuid::new_v4();
        let mut state = self.state.lock().await;

        let mut leased = Vec::new();
        for message in state.messages.iter_mut() {
            if leased.len() >= max_count {
                break;
            }
            if message.visible_at > now {
                continue;
            }

            message.visible_at = now + self.visibility_timeout;
            message.receive_count += 1;
            message.lease_token = Some(lease_token);

            leased.push(LeasedMessage {
                handle: QueueHandle::new(message.id, lease_token),
                body: message.body.clone(),
                receive_count: message.receive_count,
            });
        }

        Ok(leased)
    }

    async fn delete(&self, handle: &QueueHandle) -> Result<(), QueueStoreError> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|message| message.id != handle.message_id);
        if state.messages.len() == before {
            debug!("Message {} already removed from the queue", handle.message_id);
        }
        Ok(())
    }

    async fn dead_letter(&self, handle: &QueueHandle, reason: &str) -> Result<(), QueueStoreError> {
        let mut state = self.state.lock().await;
        let position = state.messages.iter().position(|message| {
            message.id == handle.message_id && message.lease_token == Some(handle.lease_token)
        });

        match position.and_then(|index| state.messages.remove(index)) {
            Some(message) => {
                if state.dead_letters.len() >= self.dead_letter_capacity {
                    if let Some(dropped) = state.dead_letters.pop_front() {
                        warn!(
                            "Dead letter capacity {} reached, dropping message {}: {}",
                            self.dead_letter_capacity, dropped.message_id, dropped.body
                        );
                    }
                }
                state.dead_letters.push_back(DeadLetteredMessage {
                    message_id: message.id,
                    body: message.body,
                    receive_count: message.receive_count,
                    reason: reason.to_string(),
                });
            }
            None => {
                debug!("Lease {} no longer current, skipping dead-letter", handle);
            }
        }

        Ok(())
    }

    async fn approximate_length(&self) -> Result<usize, QueueStoreError> {
        let now = Instant::now();
        let state = self.state.lock().await;
        Ok(state.messages.iter().filter(|message| message.visible_at <= now).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryQueueStore {
        InMemoryQueueStore::new(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_lease_returns_messages_in_enqueue_order_up_to_max() {
        let store = store();
        for body in ["a", "b", "c"] {
            store.enqueue(body).await.unwrap();
        }

        let leased = store.lease_batch(2).await.unwrap();
        let bodies: Vec<&str> = leased.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b"]);
        assert!(leased.iter().all(|m| m.receive_count == 1));

        let rest = store.lease_batch(10).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].body, "c");
    }

    #[tokio::test]
    async fn test_leased_messages_are_hidden_from_length() {
        let store = store();
        store.enqueue("a").await.unwrap();
        store.enqueue("b").await.unwrap();

        store.lease_batch(1).await.unwrap();

        assert_eq!(store.approximate_length().await.unwrap(), 1);
        assert_eq!(store.total_length().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undeleted_message_becomes_visible_after_timeout() {
        let store = store();
        let id = store.enqueue("a").await.unwrap();

        let first = store.lease_batch(10).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(store.lease_batch(10).await.unwrap().is_empty());

        tokio::time::advance(Duration::from_secs(31)).await;

        let second = store.lease_batch(10).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].handle.message_id, id);
        assert_eq!(second[0].receive_count, 2);
        assert_ne!(second[0].handle.lease_token, first[0].handle.lease_token);
    }

    #[tokio::test]
    async fn test_delete_twice_is_benign() {
        let store = store();
        store.enqueue("a").await.unwrap();
        let leased = store.lease_batch(1).await.unwrap();

        store.delete(&leased[0].handle).await.unwrap();
        store.delete(&leased[0].handle).await.unwrap();

        assert_eq!(store.total_length().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_letter_requires_current_lease() {
        let store = store();
        store.enqueue("a").await.unwrap();
        let stale = store.lease_batch(1).await.unwrap().remove(0);

        tokio::time::advance(Duration::from_secs(31)).await;
        let current = store.lease_batch(1).await.unwrap().remove(0);

        store.dead_letter(&stale.handle, "stale").await.unwrap();
        assert_eq!(store.total_length().await, 1);
        assert!(store.dead_letters().await.is_empty());

        store.dead_letter(&current.handle, "bad payload").await.unwrap();
        assert_eq!(store.total_length().await, 0);

        let dead = store.dead_letters().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].reason, "bad payload");
        assert_eq!(dead[0].receive_count, 2);
    }

    #[tokio::test]
    async fn test_dead_letters_keep_only_the_most_recent() {
        let store = InMemoryQueueStore { dead_letter_capacity: 2, ..store() };
        for body in ["a", "b", "c"] {
            store.enqueue(body).await.unwrap();
        }

        for message in store.lease_batch(10).await.unwrap() {
            store.dead_letter(&message.handle, "bad payload").await.unwrap();
        }

        let bodies: Vec<String> =
            store.dead_letters().await.into_iter().map(|dead| dead.body).collect();
        assert_eq!(bodies, vec!["b", "c"]);
        assert_eq!(store.total_length().await, 0);
    }
}
