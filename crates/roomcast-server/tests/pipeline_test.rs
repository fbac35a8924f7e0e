//! Pipeline orchestrator tests against deterministic collaborator fakes.

mod common;

use common::{
    test_state, FailingSynthesizer, FailingTranscriber, FixedSynthesizer, FixedTranscriber,
};
use roomcast_server::pipeline::{handle_upload, PipelineError};
use roomcast_types::DeviceRole;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

async fn recv_json(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
    let msg = tokio::time::timeout(std::time::Duration::from_millis(200), rx.recv())
        .await
        .expect("should receive within timeout")
        .expect("channel should not be closed");
    serde_json::from_str(&msg).expect("should be valid JSON")
}

#[tokio::test]
async fn empty_audio_fails_without_collaborator_calls() {
    let transcriber = FixedTranscriber::new("hello");
    let synthesizer = FixedSynthesizer::new(b"X");
    let state = test_state(transcriber.clone(), synthesizer.clone());

    let err = handle_upload(&state, "r1", b"").await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidInput));
    assert_eq!(transcriber.call_count(), 0);
    assert_eq!(synthesizer.call_count(), 0);
}

#[tokio::test]
async fn upload_with_no_speakers_still_returns_transcript() {
    let state = test_state(FixedTranscriber::new("hello"), FixedSynthesizer::new(b"X"));

    let result = handle_upload(&state, "r1", b"RIFF").await.unwrap();

    assert_eq!(result.transcript, "hello");
    assert_eq!(result.recipient_count, 0);
}

#[tokio::test]
async fn delivery_reaches_speakers_with_base64_audio() {
    let state = test_state(FixedTranscriber::new("hello"), FixedSynthesizer::new(b"X"));

    let speaker = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(16);
    state.connections.register(speaker, tx).await;
    state.connections.join(speaker, "r1", DeviceRole::Speaker).await;

    // Joining produced a room_status event first.
    let status = recv_json(&mut rx).await;
    assert_eq!(status["type"], "room_status");

    let result = handle_upload(&state, "r1", b"RIFF").await.unwrap();
    assert_eq!(result.transcript, "hello");
    assert_eq!(result.recipient_count, 1);

    let delivery = recv_json(&mut rx).await;
    assert_eq!(delivery["type"], "play_audio");
    assert_eq!(delivery["audio_data"], "WA=="); // base64 of b"X"
    assert_eq!(delivery["transcript"], "hello");
}

#[tokio::test]
async fn microphones_are_not_delivery_targets() {
    let state = test_state(FixedTranscriber::new("hello"), FixedSynthesizer::new(b"X"));

    let mic = Uuid::new_v4();
    let speaker = Uuid::new_v4();
    let (mic_tx, mut mic_rx) = mpsc::channel(16);
    let (spk_tx, mut spk_rx) = mpsc::channel(16);
    state.connections.register(mic, mic_tx).await;
    state.connections.register(speaker, spk_tx).await;
    state.connections.join(mic, "r1", DeviceRole::Microphone).await;
    state.connections.join(speaker, "r1", DeviceRole::Speaker).await;

    // Drain the join-time room_status events.
    let _ = recv_json(&mut mic_rx).await;
    let _ = recv_json(&mut mic_rx).await;
    let _ = recv_json(&mut spk_rx).await;

    let result = handle_upload(&state, "r1", b"RIFF").await.unwrap();
    assert_eq!(result.recipient_count, 1);

    let delivery = recv_json(&mut spk_rx).await;
    assert_eq!(delivery["type"], "play_audio");
    assert!(mic_rx.try_recv().is_err(), "microphone must not receive audio");
}

#[tokio::test]
async fn transcription_failure_aborts_before_synthesis() {
    let synthesizer = FixedSynthesizer::new(b"X");
    let state = test_state(Arc::new(FailingTranscriber), synthesizer.clone());

    let speaker = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(16);
    state.connections.register(speaker, tx).await;
    state.connections.join(speaker, "r1", DeviceRole::Speaker).await;
    let _ = recv_json(&mut rx).await;

    let err = handle_upload(&state, "r1", b"RIFF").await.unwrap_err();

    assert!(matches!(err, PipelineError::Transcription(_)));
    assert!(err.to_string().contains("model exploded"));
    assert_eq!(synthesizer.call_count(), 0);
    assert!(rx.try_recv().is_err(), "no broadcast after failed transcription");
}

#[tokio::test]
async fn synthesis_failure_aborts_before_broadcast() {
    let state = test_state(FixedTranscriber::new("hello"), Arc::new(FailingSynthesizer));

    let speaker = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(16);
    state.connections.register(speaker, tx).await;
    state.connections.join(speaker, "r1", DeviceRole::Speaker).await;
    let _ = recv_json(&mut rx).await;

    let err = handle_upload(&state, "r1", b"RIFF").await.unwrap_err();

    assert!(matches!(err, PipelineError::Synthesis(_)));
    assert!(rx.try_recv().is_err(), "no broadcast after failed synthesis");
}

#[tokio::test]
async fn uploads_target_only_the_named_room() {
    let state = test_state(FixedTranscriber::new("hello"), FixedSynthesizer::new(b"X"));

    let speaker = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(16);
    state.connections.register(speaker, tx).await;
    state.connections.join(speaker, "r2", DeviceRole::Speaker).await;
    let _ = recv_json(&mut rx).await;

    let result = handle_upload(&state, "r1", b"RIFF").await.unwrap();

    assert_eq!(result.recipient_count, 0);
    assert!(rx.try_recv().is_err(), "speaker in another room must not receive audio");
}

#[tokio::test]
async fn slow_collaborator_times_out_as_transcription_failure() {
    struct StallingTranscriber;

    #[async_trait::async_trait]
    impl roomcast_voice::Transcriber for StallingTranscriber {
        async fn transcribe(&self, _audio: &[u8]) -> Result<String, roomcast_voice::VoiceError> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    let mut state = test_state(Arc::new(StallingTranscriber), FixedSynthesizer::new(b"X"));
    state.stt_timeout = std::time::Duration::from_millis(20);

    let err = handle_upload(&state, "r1", b"RIFF").await.unwrap_err();

    assert!(matches!(err, PipelineError::Transcription(_)));
    assert!(err.to_string().contains("timed out"));
}
