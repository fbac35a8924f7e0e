//! Speech collaborators for the roomcast relay.
//!
//! The pipeline consumes speech-to-text and text-to-speech as opaque
//! functions over byte blobs; this crate provides those functions. The
//! [`Transcriber`] and [`Synthesizer`] traits are the seam the server
//! depends on, so tests can substitute deterministic fakes, and the
//! production implementations ([`SttService`], [`TtsService`]) drive local
//! inference binaries as subprocesses.
//!
//! Audio formats are not negotiated here: whatever bytes a device uploads
//! are handed to the STT binary as-is, and whatever the TTS binary emits is
//! broadcast as-is.

pub mod error;
pub mod stt;
pub mod tts;

pub use error::VoiceError;
pub use stt::SttService;
pub use tts::TtsService;

use async_trait::async_trait;

/// Speech-to-text collaborator: audio bytes in, transcript out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError>;
}

/// Text-to-speech collaborator: text in, audio bytes out.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError>;
}
