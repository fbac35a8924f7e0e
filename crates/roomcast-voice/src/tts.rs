use crate::{error::VoiceError, Synthesizer};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Synthesizes speech from text.
///
/// With a voice model configured, text is piped to a piper-style binary that
/// writes raw audio to stdout. Without one, `espeak-ng` serves as the system
/// fallback so a bare install still produces audio.
#[derive(Debug, Clone)]
pub struct TtsService {
    binary_path: PathBuf,
    model_path: Option<PathBuf>,
}

impl TtsService {
    pub fn new(binary_path: impl Into<PathBuf>, model_path: Option<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_path,
        }
    }

    async fn synthesize_piper(&self, text: &str, model: &PathBuf) -> Result<Vec<u8>, VoiceError> {
        let mut child = Command::new(&self.binary_path)
            .arg("--model")
            .arg(model)
            .arg("--output_raw")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("failed to spawn TTS binary: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Tts("failed to open TTS stdin".to_string()))?;
        let text_owned = text.to_string();

        // Write stdin from a task so a filled stdout buffer can't deadlock us.
        let write_task = tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("failed to wait for TTS binary: {}", e)))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Tts(format!("failed to write TTS stdin: {}", e)))
            }
            Err(e) => return Err(VoiceError::Tts(format!("TTS stdin task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("TTS binary failed: {}", stderr)));
        }

        Ok(output.stdout)
    }

    /// System fallback: `espeak-ng --stdout` emits WAV; the 44-byte header is
    /// stripped to return raw audio like the piper path.
    async fn synthesize_system(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        let child = Command::new("espeak-ng")
            .arg("--stdout")
            .arg(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("failed to spawn espeak-ng: {}", e)))?;

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("failed to wait for espeak-ng: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("espeak-ng failed: {}", stderr)));
        }

        let wav_data = output.stdout;
        if wav_data.len() > 44 {
            Ok(wav_data[44..].to_vec())
        } else {
            Ok(wav_data)
        }
    }
}

#[async_trait]
impl Synthesizer for TtsService {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        match &self.model_path {
            Some(model) => self.synthesize_piper(text, model).await,
            None => self.synthesize_system(text).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_text_is_rejected_without_spawning() {
        let tts = TtsService::new("/nonexistent/piper", None);
        let text = "a".repeat(MAX_TTS_INPUT_BYTES + 1);

        let err = tts.synthesize(&text).await.unwrap_err();
        assert!(err.to_string().contains("exceeds maximum size"));
    }

    #[tokio::test]
    async fn missing_binary_maps_to_tts_error() {
        let tts = TtsService::new(
            "/nonexistent/piper",
            Some(PathBuf::from("/nonexistent/voice.onnx")),
        );

        let err = tts.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, VoiceError::Tts(_)));
    }
}
