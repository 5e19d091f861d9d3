//! Voice profile and model definitions.
//!
//! A `VoiceProfile` maps an interview language to a specific TTS engine and
//! its parameters. The synthesizer picks the profile whose `language` matches
//! the requested target language.

use serde::{Deserialize, Serialize};

/// Supported TTS engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceModel {
    /// Piper TTS (ONNX-based, fast, local).
    #[default]
    Piper,
    /// System TTS (espeak-ng).
    System,
}

/// A voice profile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Language code this voice speaks (e.g. "en", "ja").
    pub language: String,
    /// The underlying TTS engine.
    #[serde(default)]
    pub model: VoiceModel,
    /// Path to the model file (relative to the voices directory or absolute).
    /// Unused by the system engine.
    #[serde(default)]
    pub model_path: String,
    /// Path to the model configuration file (if applicable).
    #[serde(default)]
    pub config_path: Option<String>,
    /// Speech speed multiplier (1.0 is normal).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Speaker ID within a multi-speaker model (0-indexed).
    #[serde(default)]
    pub speaker_id: Option<u32>,
    /// Output sample rate of the model, in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_speed() -> f32 {
    1.0
}

fn default_sample_rate() -> u32 {
    22_050
}

impl VoiceProfile {
    /// A profile that speaks `language` through espeak-ng.
    pub fn system(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            model: VoiceModel::System,
            model_path: String::new(),
            config_path: None,
            speed: default_speed(),
            speaker_id: None,
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            model: VoiceModel::Piper,
            model_path: "en_US-lessac-medium.onnx".to_string(),
            config_path: Some("en_US-lessac-medium.onnx.json".to_string()),
            speed: 1.0,
            speaker_id: None,
            sample_rate: default_sample_rate(),
        }
    }
}
