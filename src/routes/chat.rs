//! Chat routes: list, send text, upload image/file, clear.
//!
//! DESIGN
//! ======
//! Handlers extract form or multipart input, enforce the upload ceiling,
//! and hand off to `services::message`. Every failure is rendered as
//! `{"success": false, "message": ...}` with a 4xx/5xx status. Store errors
//! are logged with their source but reported to the client generically.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Form, FromRequest, Multipart, Request, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::services::message::{self, BinaryKind, BinaryUpload, MessageError};
use crate::state::AppState;
use crate::store::Message;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("file too large (limit {limit} bytes)")]
    UploadTooLarge { limit: usize },
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ApiError {
    fn public_message(&self) -> String {
        match self {
            Self::Message(MessageError::Fetch(_)) => "Error fetching messages".into(),
            Self::Message(MessageError::Write(_)) => "Error sending message".into(),
            Self::Message(MessageError::Clear(_)) => "Error clearing chat".into(),
            Self::Message(err @ MessageError::Validation(_)) => err.to_string(),
            Self::UploadTooLarge { .. } => "file too large".into(),
            Self::Malformed(detail) => detail.clone(),
        }
    }
}

pub(crate) fn api_error_to_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Message(MessageError::Validation(_)) | ApiError::UploadTooLarge { .. } | ApiError::Malformed(_) => {
            StatusCode::BAD_REQUEST
        }
        ApiError::Message(MessageError::Fetch(_) | MessageError::Write(_) | MessageError::Clear(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = api_error_to_status(&self);
        if status.is_server_error() {
            error!(error = %self, "chat request failed");
        } else {
            warn!(error = %self, "chat request rejected");
        }
        (status, Json(serde_json::json!({ "success": false, "message": self.public_message() }))).into_response()
    }
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge { limit }
    } else {
        ApiError::Malformed(err.body_text())
    }
}

fn success(message: &str) -> Response {
    Json(serde_json::json!({ "success": true, "message": message })).into_response()
}

// =============================================================================
// MULTIPART
// =============================================================================

/// Fields collected from an upload form.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub from: Option<String>,
    pub file_name: Option<String>,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub payload: Option<Vec<u8>>,
}

impl UploadForm {
    fn as_upload(&self) -> BinaryUpload<'_> {
        BinaryUpload {
            from: self.from.as_deref(),
            payload: self.payload.as_deref(),
            mime_type: self.mime_type.as_deref(),
            // Explicit form field wins over the client-side file name.
            file_name: self
                .file_name
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(self.original_name.as_deref()),
        }
    }
}

/// Drain a multipart body, buffering the `file_field` part up to `limit` bytes.
pub(crate) async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
    limit: usize,
) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        let name = field.name().unwrap_or_default().to_owned();
        if name == file_field {
            form.mime_type = field.content_type().map(str::to_owned);
            form.original_name = field.file_name().map(str::to_owned);

            let mut buf = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
                if buf.len() + chunk.len() > limit {
                    return Err(ApiError::UploadTooLarge { limit });
                }
                buf.extend_from_slice(&chunk);
            }
            form.payload = Some(buf);
            continue;
        }

        match name.as_str() {
            "from" => form.from = Some(field.text().await.map_err(|e| multipart_error(e, limit))?),
            "fileName" => form.file_name = Some(field.text().await.map_err(|e| multipart_error(e, limit))?),
            _ => {}
        }
    }

    Ok(form)
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn has_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}

/// Chat page URL that pre-fills the sender after a form upload.
pub(crate) fn chat_page_location(from: &str) -> String {
    match serde_urlencoded::to_string([("from", from)]) {
        Ok(query) => format!("/?{query}"),
        Err(_) => "/".to_owned(),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /chat`: all messages, oldest first.
pub async fn list_chat(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = message::list_messages(state.store.as_ref()).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct SendTextBody {
    pub from: Option<String>,
    pub message: Option<String>,
}

/// `POST /send`: append a text message from a urlencoded form or a JSON body.
pub async fn send_text(State(state): State<AppState>, request: Request) -> Result<StatusCode, ApiError> {
    let body = if has_json_body(request.headers()) {
        let Json(body) = Json::<SendTextBody>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::Malformed(e.body_text()))?;
        body
    } else {
        let Form(body) = Form::<SendTextBody>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::Malformed(e.body_text()))?;
        body
    };
    let stored = message::append_text(state.store.as_ref(), body.from.as_deref(), body.message.as_deref()).await?;
    info!(id = %stored.id, from = %stored.from, "text message stored");
    Ok(StatusCode::OK)
}

async fn store_upload(state: &AppState, kind: BinaryKind, form: &UploadForm) -> Result<Message, ApiError> {
    let stored = message::append_binary(state.store.as_ref(), kind, form.as_upload()).await?;
    info!(
        id = %stored.id,
        kind = stored.kind.as_str(),
        from = %stored.from,
        size = stored.file_size.unwrap_or_default(),
        "binary message stored"
    );
    Ok(stored)
}

/// `POST /send-image`: multipart `image` + `from`.
///
/// Browsers posting the form directly are redirected back to the chat page;
/// clients asking for JSON get `{success, message}`.
pub async fn send_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::Malformed(e.body_text()))?;
    let form = read_upload(multipart, BinaryKind::Image.field_name(), state.upload_limit).await?;
    let stored = store_upload(&state, BinaryKind::Image, &form).await?;

    if wants_json(&headers) {
        return Ok(success("Image uploaded"));
    }
    Ok(Redirect::to(&chat_page_location(&stored.from)).into_response())
}

/// `POST /send-file`: multipart `file` + `from` + optional `fileName`.
pub async fn send_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::Malformed(e.body_text()))?;
    let form = read_upload(multipart, BinaryKind::File.field_name(), state.upload_limit).await?;
    store_upload(&state, BinaryKind::File, &form).await?;
    Ok(success("File uploaded"))
}

/// `POST /clear-chat`: delete every message in one batch.
pub async fn clear_chat(State(state): State<AppState>) -> Result<Response, ApiError> {
    let removed = message::clear_messages(state.store.as_ref()).await?;
    info!(removed, "chat cleared");
    Ok(success("Chat cleared"))
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
