//! Upload API: accepts a voice clip and feeds it through the relay pipeline.

use crate::pipeline::{self, PipelineError};
use crate::AppState;
use axum::{
    extract::{Extension, Multipart},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roomcast_types::DEFAULT_ROOM_ID;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Success body. Carries the transcript so the uploading device gets
/// feedback even when no speaker is listening.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub transcript: String,
}

/// Upload failures mapped to HTTP status codes.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("malformed upload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::Malformed(_) | UploadError::Pipeline(PipelineError::InvalidInput) => {
                StatusCode::BAD_REQUEST
            }
            UploadError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "status": "Error processing audio",
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Handler for `POST /upload`.
///
/// Multipart form with an `audio` file field and an optional `room_id` text
/// field; unnamed rooms fall back to the default room.
pub async fn upload_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut audio: Option<Vec<u8>> = None;
    let mut room_id = DEFAULT_ROOM_ID.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        match field.name() {
            Some("audio") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Malformed(e.to_string()))?;
                audio = Some(bytes.to_vec());
            }
            Some("room_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.to_string()))?;
                if !value.is_empty() {
                    room_id = value;
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or(PipelineError::InvalidInput)?;
    let result = pipeline::handle_upload(&state, &room_id, &audio).await?;

    tracing::info!(
        room_id = %room_id,
        recipients = result.recipient_count,
        "audio relayed to speakers"
    );

    Ok(Json(UploadResponse {
        status: "Audio sent to speakers".to_string(),
        transcript: result.transcript,
    }))
}
