//! Speech collaborators for the interview service.
//!
//! The interview loop only ever sees two object-safe traits:
//! [`SpeechToText`] turns a recorded answer into text, and
//! [`SpeechSynthesizer`] renders a question as playable audio. Local engines
//! (whisper.cpp, Piper, espeak-ng) run as subprocesses; the hosted Whisper
//! API is reached over HTTP.

pub mod audio;
pub mod config;
pub mod error;
pub mod stt;
pub mod tts;
pub mod whisper_api;

use async_trait::async_trait;

pub use audio::{AudioEncoding, SynthesizedAudio};
pub use config::{SpeechConfig, SttBackend};
pub use error::VoiceError;
pub use stt::{SttService, MAX_STT_INPUT_BYTES};
pub use tts::{TtsService, MAX_TTS_INPUT_BYTES};
pub use whisper_api::WhisperApiClient;

/// Recognises speech in a recorded audio clip.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Returns the recognised text. Silence or unintelligible audio is an
    /// error, never an empty string.
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<String, VoiceError>;
}

/// Renders text as speech in a given language.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str)
        -> Result<SynthesizedAudio, VoiceError>;
}

/// Trims recogniser output and rejects an empty result.
pub(crate) fn recognised_text(raw: &str) -> Result<String, VoiceError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(VoiceError::Stt("no speech recognised".to_string()));
    }
    Ok(text.to_string())
}
