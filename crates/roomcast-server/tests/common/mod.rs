//! Shared test fixtures: deterministic collaborator fakes and app state
//! setup.

#![allow(dead_code)]

use async_trait::async_trait;
use roomcast_rooms::ConnectionManager;
use roomcast_server::AppState;
use roomcast_voice::{Synthesizer, Transcriber, VoiceError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Transcriber fake returning a fixed transcript and counting invocations.
pub struct FixedTranscriber {
    transcript: String,
    calls: AtomicUsize,
}

impl FixedTranscriber {
    pub fn new(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.transcript.clone())
    }
}

/// Transcriber fake that always fails.
pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, VoiceError> {
        Err(VoiceError::Stt("model exploded".to_string()))
    }
}

/// Synthesizer fake returning fixed audio bytes and counting invocations.
pub struct FixedSynthesizer {
    audio: Vec<u8>,
    calls: AtomicUsize,
}

impl FixedSynthesizer {
    pub fn new(audio: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            audio: audio.to_vec(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for FixedSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.audio.clone())
    }
}

/// Synthesizer fake that always fails.
pub struct FailingSynthesizer;

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, VoiceError> {
        Err(VoiceError::Tts("no voice available".to_string()))
    }
}

/// App state wired with the given collaborator fakes.
pub fn test_state(
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
) -> AppState {
    AppState {
        connections: ConnectionManager::new(),
        transcriber,
        synthesizer,
        stt_timeout: Duration::from_secs(5),
        tts_timeout: Duration::from_secs(5),
    }
}
