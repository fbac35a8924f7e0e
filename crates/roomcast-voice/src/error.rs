use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("transcription error: {0}")]
    Stt(String),

    #[error("synthesis error: {0}")]
    Tts(String),
}
