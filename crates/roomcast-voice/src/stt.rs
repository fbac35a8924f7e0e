use crate::{error::VoiceError, Transcriber};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum audio input size for STT (10 MiB). Prevents OOM from oversized payloads.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Transcribes audio by shelling out to a whisper.cpp-style binary.
///
/// The binary is expected to accept `-m <model> -f <audio_file> -nt` and
/// print the bare transcript to stdout.
#[derive(Debug, Clone)]
pub struct SttService {
    binary_path: PathBuf,
    model_path: PathBuf,
}

impl SttService {
    pub fn new(binary_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model_path: model_path.into(),
        }
    }
}

#[async_trait]
impl Transcriber for SttService {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError> {
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Stt(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        // Stage the clip to a temp file for the binary. The guard deletes the
        // file on drop, so every exit path below releases it.
        let staged = tempfile::Builder::new()
            .prefix("roomcast-stt-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| VoiceError::Stt(format!("failed to stage audio: {}", e)))?;
        tokio::fs::write(staged.path(), audio)
            .await
            .map_err(|e| VoiceError::Stt(format!("failed to stage audio: {}", e)))?;

        let child = Command::new(&self.binary_path)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(staged.path())
            .arg("-nt") // transcript only, no timestamps
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VoiceError::Stt(format!("failed to spawn STT binary: {}", e)))?;

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Stt(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Stt(format!("failed to read STT output: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Stt(format!("STT binary failed: {}", stderr)));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(text)
    }
}
