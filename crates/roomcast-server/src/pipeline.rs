//! Upload pipeline: transcribe, re-synthesize, broadcast to the room's
//! speakers.

use crate::AppState;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use roomcast_types::ServerEvent;
use thiserror::Error;

/// Pipeline failures surfaced to the uploading device.
///
/// Each variant aborts the remainder of the pipeline. Per-recipient delivery
/// failures never appear here; they are logged and recovered locally.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no audio provided")]
    InvalidInput,
    #[error("transcription failed: {0}")]
    Transcription(String),
    #[error("synthesis failed: {0}")]
    Synthesis(String),
}

/// Synchronous outcome of one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Transcript of the uploaded clip; also broadcast to speakers.
    pub transcript: String,
    /// Number of speaker connections the delivery targeted. Zero recipients
    /// is a success: the uploader still gets the transcript back.
    pub recipient_count: usize,
}

/// Runs the relay pipeline for one uploaded clip.
///
/// Collaborator calls are bounded by the configured timeouts and happen
/// outside any registry lock; the speaker set is a point-in-time snapshot
/// and each send is independent and non-blocking.
pub async fn handle_upload(
    state: &AppState,
    room_id: &str,
    audio: &[u8],
) -> Result<DeliveryResult, PipelineError> {
    if audio.is_empty() {
        return Err(PipelineError::InvalidInput);
    }

    let transcript = match tokio::time::timeout(
        state.stt_timeout,
        state.transcriber.transcribe(audio),
    )
    .await
    {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(PipelineError::Transcription(e.to_string())),
        Err(_) => {
            return Err(PipelineError::Transcription(format!(
                "timed out after {} seconds",
                state.stt_timeout.as_secs()
            )))
        }
    };
    tracing::info!(room_id = %room_id, transcript = %transcript, "transcribed upload");

    let audio_out = match tokio::time::timeout(
        state.tts_timeout,
        state.synthesizer.synthesize(&transcript),
    )
    .await
    {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return Err(PipelineError::Synthesis(e.to_string())),
        Err(_) => {
            return Err(PipelineError::Synthesis(format!(
                "timed out after {} seconds",
                state.tts_timeout.as_secs()
            )))
        }
    };

    let speakers = state.connections.snapshot_speakers(room_id).await;
    let event = ServerEvent::PlayAudio {
        audio_data: BASE64.encode(&audio_out),
        transcript: transcript.clone(),
    };
    match serde_json::to_string(&event) {
        Ok(json) => {
            for connection_id in &speakers {
                state.connections.send(*connection_id, json.clone()).await;
            }
        }
        Err(e) => {
            tracing::error!(room_id = %room_id, "failed to serialize play_audio: {}", e);
        }
    }

    Ok(DeliveryResult {
        transcript,
        recipient_count: speakers.len(),
    })
}
