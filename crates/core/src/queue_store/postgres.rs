use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::debug;
use uuid::Uuid;

use super::{LeasedMessage, MessageId, QueueHandle, QueueStore, QueueStoreError};
use crate::postgres::{PostgresClient, PostgresError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS relay_queue_messages (
    id UUID PRIMARY KEY,
    queue_name TEXT NOT NULL,
    body TEXT NOT NULL,
    enqueued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    visible_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    receive_count INTEGER NOT NULL DEFAULT 0,
    lease_token UUID,
    dead_lettered_at TIMESTAMPTZ,
    dead_letter_reason TEXT
);

CREATE INDEX IF NOT EXISTS relay_queue_messages_visible_idx
    ON relay_queue_messages (queue_name, visible_at, enqueued_at)
    WHERE dead_lettered_at IS NULL;
"#;

const ENQUEUE: &str = r#"
INSERT INTO relay_queue_messages (id, queue_name, body)
VALUES ($1, $2, $3)
"#;

const LEASE_BATCH: &str = r#"
UPDATE relay_queue_messages AS message
SET visible_at = NOW() + make_interval(secs => $3),
    receive_count = message.receive_count + 1,
    lease_token = $4
FROM (
    SELECT id
    FROM relay_queue_messages
    WHERE queue_name = $1
      AND dead_lettered_at IS NULL
      AND visible_at <= NOW()
    ORDER BY enqueued_at, id
    LIMIT $2
    FOR UPDATE SKIP LOCKED
) AS next
WHERE message.id = next.id
RETURNING message.id, message.body, message.receive_count, message.enqueued_at
"#;

const DELETE: &str = r#"
DELETE FROM relay_queue_messages
WHERE id = $1 AND queue_name = $2
"#;

const DEAD_LETTER: &str = r#"
UPDATE relay_queue_messages
SET dead_lettered_at = NOW(), dead_letter_reason = $4
WHERE id = $1 AND queue_name = $2 AND lease_token = $3 AND dead_lettered_at IS NULL
"#;

const APPROXIMATE_LENGTH: &str = r#"
SELECT COUNT(*) FROM relay_queue_messages
WHERE queue_name = $1 AND dead_lettered_at IS NULL AND visible_at <= NOW()
"#;

/// Queue store backed by a Postgres table. Several relay processes may share the table;
/// `queue_name` keeps the messages of different signing accounts apart.
pub struct PostgresQueueStore {
    db: Arc<PostgresClient>,
    queue_name: String,
    visibility_timeout: Duration,
}

impl PostgresQueueStore {
    pub fn new(db: Arc<PostgresClient>, queue_name: &str, visibility_timeout: Duration) -> Self {
        PostgresQueueStore { db, queue_name: queue_name.to_string(), visibility_timeout }
    }

    pub async fn apply_schema(&self) -> Result<(), PostgresError> {
        self.db.batch_execute(SCHEMA).await
    }
}

fn leased_message(id: Uuid, body: String, receive_count: i32, lease_token: Uuid) -> LeasedMessage {
    LeasedMessage {
        handle: QueueHandle::new(MessageId::from_uuid(id), lease_token),
        body,
        receive_count: u32::try_from(receive_count).unwrap_or(0),
    }
}

fn leased_message_from_row(
    row: &Row,
    lease_token: Uuid,
) -> Result<(DateTime<Utc>, LeasedMessage), QueueStoreError> {
    let invalid = |e: tokio_postgres::Error| QueueStoreError::InvalidRow(e.to_string());

    let id: Uuid = row.try_get("id").map_err(invalid)?;
    let body: String = row.try_get("body").map_err(invalid)?;
    let receive_count: i32 = row.try_get("receive_count").map_err(invalid)?;
    let enqueued_at: DateTime<Utc> = row.try_get("enqueued_at").map_err(invalid)?;

    Ok((enqueued_at, leased_message(id, body, receive_count, lease_token)))
}

/// RETURNING does not keep the ORDER BY of the sub select, so restore `enqueued_at, id`.
fn in_enqueue_order(mut leased: Vec<(DateTime<Utc>, LeasedMessage)>) -> Vec<LeasedMessage> {
    leased.sort_by_key(|(enqueued_at, message)| {
        (*enqueued_at, message.handle.message_id.into_uuid())
    });
    leased.into_iter().map(|(_, message)| message).collect()
}

#[async_trait]
impl QueueStore for PostgresQueueStore {
    async fn enqueue(&self, body: &str) -> Result<MessageId, QueueStoreError> {
        let id = MessageId::new();
        self.db.execute(ENQUEUE, &[&id.into_uuid(), &self.queue_name, &body]).await?;
        Ok(id)
    }

    async fn lease_batch(&self, max_count: usize) -> Result<Vec<LeasedMessage>, QueueStoreError> {
        let lease_token = Uuid::new_v4();
        let limit = max_count as i64;
        let visibility_seconds = self.visibility_timeout.as_secs_f64();

        let rows = self
            .db
            .query(LEASE_BATCH, &[&self.queue_name, &limit, &visibility_seconds, &lease_token])
            .await?;

        let leased = rows
            .iter()
            .map(|row| leased_message_from_row(row, lease_token))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(in_enqueue_order(leased))
    }

    async fn delete(&self, handle: &QueueHandle) -> Result<(), QueueStoreError> {
        let removed =
            self.db.execute(DELETE, &[&handle.message_id.into_uuid(), &self.queue_name]).await?;
        if removed == 0 {
            debug!("Message {} already removed from queue {}", handle.message_id, self.queue_name);
        }
        Ok(())
    }

    async fn dead_letter(&self, handle: &QueueHandle, reason: &str) -> Result<(), QueueStoreError> {
        let updated = self
            .db
            .execute(
                DEAD_LETTER,
                &[&handle.message_id.into_uuid(), &self.queue_name, &handle.lease_token, &reason],
            )
            .await?;
        if updated == 0 {
            debug!("Lease {} no longer current, skipping dead-letter", handle);
        }
        Ok(())
    }

    async fn approximate_length(&self) -> Result<usize, QueueStoreError> {
        let row = self.db.query_one(APPROXIMATE_LENGTH, &[&self.queue_name]).await?;
        let count: i64 =
            row.try_get(0).map_err(|e| QueueStoreError::InvalidRow(e.to_string()))?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap()
    }

    fn message(id: u128, body: &str, lease_token: Uuid) -> LeasedMessage {
        leased_message(Uuid::from_u128(id), body.to_string(), 1, lease_token)
    }

    #[test]
    fn test_leased_rows_are_returned_in_enqueue_order() {
        let lease_token = Uuid::new_v4();
        let leased = in_enqueue_order(vec![
            (at(3), message(1, "third", lease_token)),
            (at(1), message(9, "first", lease_token)),
            (at(2), message(5, "second b", lease_token)),
            (at(2), message(4, "second a", lease_token)),
        ]);

        let bodies: Vec<&str> = leased.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second a", "second b", "third"]);
    }

    #[test]
    fn test_row_values_become_handle_with_lease_token() {
        let id = Uuid::new_v4();
        let lease_token = Uuid::new_v4();
        let leased = leased_message(id, "{}".to_string(), 3, lease_token);

        assert_eq!(leased.handle.message_id, MessageId::from_uuid(id));
        assert_eq!(leased.handle.lease_token, lease_token);
        assert_eq!(leased.receive_count, 3);
        assert_eq!(leased_message(id, String::new(), -1, lease_token).receive_count, 0);
    }

    #[test]
    fn test_queries_only_touch_live_visible_messages() {
        assert!(LEASE_BATCH.contains("dead_lettered_at IS NULL"));
        assert!(LEASE_BATCH.contains("visible_at <= NOW()"));
        assert!(LEASE_BATCH.contains("ORDER BY enqueued_at, id"));
        assert!(LEASE_BATCH.contains("FOR UPDATE SKIP LOCKED"));
        assert!(APPROXIMATE_LENGTH.contains("visible_at <= NOW()"));
        assert!(APPROXIMATE_LENGTH.contains("dead_lettered_at IS NULL"));
        assert!(DEAD_LETTER.contains("lease_token = $3"));
    }

    /// Runs against a real database when `DATABASE_URL` is set, otherwise does nothing.
    #[tokio::test]
    async fn test_lease_dead_letter_and_length_against_database() {
        if crate::postgres::connection_string().is_err() {
            return;
        }
        let db = Arc::new(PostgresClient::new().await.unwrap());
        let queue_name = format!("test-{}", Uuid::new_v4());
        let store = PostgresQueueStore::new(db, &queue_name, Duration::from_secs(30));
        store.apply_schema().await.unwrap();

        for body in ["a", "b", "c"] {
            store.enqueue(body).await.unwrap();
        }

        let leased = store.lease_batch(2).await.unwrap();
        let bodies: Vec<&str> = leased.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b"]);
        assert_eq!(store.approximate_length().await.unwrap(), 1);

        let stale = QueueHandle::new(leased[0].handle.message_id, Uuid::new_v4());
        store.dead_letter(&stale, "stale").await.unwrap();
        store.dead_letter(&leased[0].handle, "bad payload").await.unwrap();
        store.delete(&leased[1].handle).await.unwrap();
        store.delete(&leased[1].handle).await.unwrap();

        let rest = store.lease_batch(10).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].body, "c");
        assert_eq!(store.approximate_length().await.unwrap(), 0);
    }
}
