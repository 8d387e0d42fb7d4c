//! Message service: the façade between HTTP routes and the document store.
//!
//! DESIGN
//! ======
//! Four operations: list, append text, append binary, clear. Each is a
//! single independent round trip to the store; no state is kept here.
//! Input normalization (`from` defaulting, data URI encoding) happens in
//! pure functions before the store is called, so a rejected request never
//! reaches the database.
//!
//! Upload size limits are the caller's job. This module accepts whatever
//! payload it is handed.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tracing::debug;

use crate::store::{Message, MessageKind, MessageStore, NewMessage, StoreError};

pub const ANONYMOUS: &str = "anonymous";
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
pub const DEFAULT_FILE_NAME: &str = "upload";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("error fetching messages: {0}")]
    Fetch(#[source] StoreError),
    #[error("error writing message: {0}")]
    Write(#[source] StoreError),
    #[error("no {0} uploaded")]
    Validation(&'static str),
    #[error("error clearing chat: {0}")]
    Clear(#[source] StoreError),
}

/// Which binary variant an upload becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    Image,
    File,
}

impl BinaryKind {
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

impl From<BinaryKind> for MessageKind {
    fn from(kind: BinaryKind) -> Self {
        match kind {
            BinaryKind::Image => Self::Image,
            BinaryKind::File => Self::File,
        }
    }
}

/// Raw upload as received from the client. Every field may be missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryUpload<'a> {
    pub from: Option<&'a str>,
    pub payload: Option<&'a [u8]>,
    pub mime_type: Option<&'a str>,
    pub file_name: Option<&'a str>,
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Sender label to store: the trimmed input, or `"anonymous"` when blank.
#[must_use]
pub fn normalize_sender(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => ANONYMOUS.to_owned(),
    }
}

/// Encode bytes as `data:<mime>;base64,<payload>`.
#[must_use]
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Build the text document for `append_text`.
#[must_use]
pub fn text_record(from: Option<&str>, content: Option<&str>) -> NewMessage {
    NewMessage {
        kind: MessageKind::Text,
        from: normalize_sender(from),
        content: content.unwrap_or_default().to_owned(),
        file_name: None,
        file_size: None,
        mime_type: None,
    }
}

/// Build the binary document for `append_binary`.
///
/// # Errors
///
/// Returns `Validation` if the upload carries no bytes.
pub fn binary_record(kind: BinaryKind, upload: BinaryUpload<'_>) -> Result<NewMessage, MessageError> {
    let Some(bytes) = upload.payload.filter(|b| !b.is_empty()) else {
        return Err(MessageError::Validation(kind.field_name()));
    };

    let mime_type = non_blank(upload.mime_type).unwrap_or(DEFAULT_MIME_TYPE);
    let file_name = non_blank(upload.file_name).unwrap_or(DEFAULT_FILE_NAME);

    Ok(NewMessage {
        kind: kind.into(),
        from: normalize_sender(upload.from),
        content: data_uri(mime_type, bytes),
        file_name: Some(file_name.to_owned()),
        file_size: Some(bytes.len() as u64),
        mime_type: Some(mime_type.to_owned()),
    })
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Every message, ascending by creation time.
///
/// # Errors
///
/// Returns `Fetch` if the store query fails.
pub async fn list_messages(store: &dyn MessageStore) -> Result<Vec<Message>, MessageError> {
    store.fetch_ordered().await.map_err(MessageError::Fetch)
}

/// Store a text message.
///
/// # Errors
///
/// Returns `Write` if the insert fails.
pub async fn append_text(
    store: &dyn MessageStore,
    from: Option<&str>,
    content: Option<&str>,
) -> Result<Message, MessageError> {
    store
        .insert(text_record(from, content))
        .await
        .map_err(MessageError::Write)
}

/// Store an image or file message with its bytes inlined as a data URI.
///
/// # Errors
///
/// Returns `Validation` without touching the store when there is no
/// payload, or `Write` if the insert fails.
pub async fn append_binary(
    store: &dyn MessageStore,
    kind: BinaryKind,
    upload: BinaryUpload<'_>,
) -> Result<Message, MessageError> {
    let record = binary_record(kind, upload)?;
    store.insert(record).await.map_err(MessageError::Write)
}

/// Delete every message in one atomic batch. Returns how many were removed.
///
/// # Errors
///
/// Returns `Clear` if listing or the batch commit fails. In that case the
/// collection is left as it was.
pub async fn clear_messages(store: &dyn MessageStore) -> Result<usize, MessageError> {
    let ids = store.list_ids().await.map_err(MessageError::Clear)?;
    store.delete_batch(&ids).await.map_err(MessageError::Clear)?;
    debug!(count = ids.len(), "message batch deleted");
    Ok(ids.len())
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
