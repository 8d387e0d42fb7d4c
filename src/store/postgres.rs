//! Postgres-backed document collection.
//!
//! DESIGN
//! ======
//! All collections share the `documents` table; each row carries its
//! collection name and a JSONB body. `id` and `created_at` are assigned by
//! the database (`gen_random_uuid()`, `clock_timestamp()`), and the `seq`
//! column breaks ties between rows stamped in the same microsecond.
//!
//! ERROR HANDLING
//! ==============
//! Batch deletes run inside one transaction. Any failure before commit rolls
//! the whole batch back when the transaction is dropped.

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Message, MessageStore, NewMessage, StoreError, parse_ids};

pub const DEFAULT_COLLECTION: &str = "messages";

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    collection: String,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self { pool, collection: collection.into() }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait::async_trait]
impl MessageStore for PgDocumentStore {
    async fn fetch_ordered(&self) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, serde_json::Value, OffsetDateTime)>(
            "SELECT id, data, created_at
             FROM documents
             WHERE collection = $1
             ORDER BY created_at ASC, seq ASC",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, data, created_at)| {
                let body: NewMessage = serde_json::from_value(data)?;
                Ok(Message::stored(id.to_string(), created_at, body))
            })
            .collect()
    }

    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let data = serde_json::to_value(&message)?;
        let (id, created_at) = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(
            "INSERT INTO documents (collection, data) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(&self.collection)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(Message::stored(id.to_string(), created_at, message))
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM documents WHERE collection = $1")
            .bind(&self.collection)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<(), StoreError> {
        let ids = parse_ids(ids)?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = ANY($2)")
            .bind(&self.collection)
            .bind(&ids)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
