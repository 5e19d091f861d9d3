use insight_types::voice::VoiceProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which recogniser answers audio turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SttBackend {
    /// Local whisper.cpp binary.
    #[default]
    WhisperCpp,
    /// OpenAI-compatible `/audio/transcriptions` endpoint.
    WhisperApi,
}

fn default_whisper_binary() -> PathBuf {
    PathBuf::from("whisper-cli")
}

fn default_whisper_model() -> PathBuf {
    PathBuf::from("models/ggml-base.bin")
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_model() -> String {
    "whisper-1".to_string()
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("assets/voices")
}

fn default_piper_binary() -> PathBuf {
    PathBuf::from("piper")
}

fn default_espeak_binary() -> PathBuf {
    PathBuf::from("espeak-ng")
}

fn default_voices() -> Vec<VoiceProfile> {
    vec![VoiceProfile::system("en"), VoiceProfile::system("ja")]
}

/// The `[speech]` configuration section.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub stt_backend: SttBackend,
    #[serde(default = "default_whisper_binary")]
    pub whisper_binary: PathBuf,
    #[serde(default = "default_whisper_model")]
    pub whisper_model: PathBuf,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Key for the hosted recogniser. Empty means "reuse the LLM key".
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_api_model")]
    pub api_model: String,
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,
    #[serde(default = "default_piper_binary")]
    pub piper_binary: PathBuf,
    #[serde(default = "default_espeak_binary")]
    pub espeak_binary: PathBuf,
    /// One profile per interview language.
    #[serde(default = "default_voices")]
    pub voices: Vec<VoiceProfile>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stt_backend: SttBackend::default(),
            whisper_binary: default_whisper_binary(),
            whisper_model: default_whisper_model(),
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            api_model: default_api_model(),
            voices_dir: default_voices_dir(),
            piper_binary: default_piper_binary(),
            espeak_binary: default_espeak_binary(),
            voices: default_voices(),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("stt_backend", &self.stt_backend)
            .field("whisper_binary", &self.whisper_binary)
            .field("whisper_model", &self.whisper_model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &"[REDACTED]")
            .field("api_model", &self.api_model)
            .field("voices_dir", &self.voices_dir)
            .field("piper_binary", &self.piper_binary)
            .field("espeak_binary", &self.espeak_binary)
            .field("voices", &self.voices)
            .finish()
    }
}
