use crate::error::VoiceError;
use crate::stt::{check_audio, whisper_language};
use crate::{recognised_text, SpeechToText};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::time::Duration;

/// Hosted recogniser speaking the OpenAI `/audio/transcriptions` protocol.
#[derive(Clone)]
pub struct WhisperApiClient {
    base_url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl fmt::Debug for WhisperApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhisperApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl WhisperApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| VoiceError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            http,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechToText for WhisperApiClient {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String, VoiceError> {
        if self.api_key.trim().is_empty() {
            return Err(VoiceError::Config(
                "an API key is required for hosted transcription".to_string(),
            ));
        }
        check_audio(audio)?;

        let audio_part = Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::Stt(format!("Failed to create audio part: {}", e)))?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.model.clone())
            .text("response_format", "text")
            .text("temperature", "0");
        let language = whisper_language(language);
        if language != "auto" {
            form = form.text("language", language.to_string());
        }

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VoiceError::Stt(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(VoiceError::Stt(format!(
                "transcription failed with status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VoiceError::Stt(format!("Failed to read transcription: {}", e)))?;
        let text = recognised_text(&body)?;
        tracing::debug!(language, chars = text.chars().count(), "transcribed audio via API");
        Ok(text)
    }
}
