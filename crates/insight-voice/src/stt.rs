use crate::error::VoiceError;
use crate::{recognised_text, SpeechToText};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum audio input size for STT (10 MiB).
pub const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Local recogniser backed by a whisper.cpp binary.
#[derive(Debug, Clone)]
pub struct SttService {
    model_path: PathBuf,
    binary_path: PathBuf,
}

impl SttService {
    pub fn new(model_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
        }
    }

    fn command(&self, language: &str) -> Command {
        // -f - reads WAV from stdin, -nt drops timestamps so stdout is the
        // bare transcript.
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-l")
            .arg(whisper_language(language))
            .arg("-nt")
            .arg("-f")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl SpeechToText for SttService {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String, VoiceError> {
        check_audio(audio)?;

        let mut child = self
            .command(language)
            .spawn()
            .map_err(|e| VoiceError::Stt(format!("Failed to spawn STT binary: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Stt("Failed to open stdin".to_string()))?;
        let audio_owned = audio.to_vec();
        let write_task = tokio::spawn(async move { stdin.write_all(&audio_owned).await });

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Stt(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Stt(format!("Failed to read stdout: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Stt(format!("STT binary failed: {}", stderr)));
        }

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Stt(format!("Failed to write to stdin: {}", e)))
            }
            Err(e) => return Err(VoiceError::Stt(format!("Stdin task failed: {}", e))),
        }

        let text = recognised_text(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(language, chars = text.chars().count(), "transcribed audio locally");
        Ok(text)
    }
}

pub(crate) fn check_audio(audio: &[u8]) -> Result<(), VoiceError> {
    if audio.is_empty() {
        return Err(VoiceError::Stt("audio data is empty".to_string()));
    }
    if audio.len() > MAX_STT_INPUT_BYTES {
        return Err(VoiceError::Stt(format!(
            "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
            audio.len(),
            MAX_STT_INPUT_BYTES
        )));
    }
    Ok(())
}

/// Whisper knows languages by their bare ISO 639-1 code.
pub(crate) fn whisper_language(language: &str) -> &str {
    let base = language.split(|c: char| c == '-' || c == '_').next().unwrap_or(language);
    if base.is_empty() {
        "auto"
    } else {
        base
    }
}
