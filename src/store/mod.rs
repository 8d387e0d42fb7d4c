//! Document store seam for chat messages.
//!
//! DESIGN
//! ======
//! Messages live as JSON documents in a single named collection. The store
//! assigns `id` and `time` on insert; callers only hand over a validated
//! [`NewMessage`]. The façade in `services::message` talks to the store via
//! the [`MessageStore`] trait so the backing database can be swapped (and
//! faked in tests) without touching route code.
//!
//! Two backends ship with the server:
//! - [`postgres::PgDocumentStore`]: JSONB documents in Postgres.
//! - [`memory::MemoryStore`]: process-local, for tests and `STORE_BACKEND=memory`.

pub mod memory;
pub mod postgres;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid document id: {0}")]
    InvalidId(String),
}

// =============================================================================
// MESSAGE
// =============================================================================

/// Message variant. Serialized as the lowercase `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    File,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

/// Validated message record, before the store assigns `id` and `time`.
/// This is exactly the document body persisted in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub from: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A stored chat message as returned by `GET /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub from: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

impl Message {
    /// Combine a document body with the store-assigned id and timestamp.
    #[must_use]
    pub fn stored(id: String, time: OffsetDateTime, body: NewMessage) -> Self {
        Self {
            id,
            kind: body.kind,
            from: body.from,
            content: body.content,
            file_name: body.file_name,
            file_size: body.file_size,
            mime_type: body.mime_type,
            time,
        }
    }
}

/// Parse document ids, failing on the first one that is not a UUID.
/// Both backends run this before touching a batch.
pub(crate) fn parse_ids(ids: &[String]) -> Result<Vec<Uuid>, StoreError> {
    ids.iter()
        .map(|raw| Uuid::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.clone())))
        .collect()
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Collection-level operations the façade needs from a document store.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Every message in the collection, ascending by `time` then insertion order.
    async fn fetch_ordered(&self) -> Result<Vec<Message>, StoreError>;

    /// Insert one document; the store assigns `id` and `time`.
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// Ids of every document currently in the collection.
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Delete the given documents in one all-or-nothing batch.
    async fn delete_batch(&self, ids: &[String]) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
