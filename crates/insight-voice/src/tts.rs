use crate::audio::{AudioEncoding, SynthesizedAudio};
use crate::error::VoiceError;
use crate::SpeechSynthesizer;
use async_trait::async_trait;
use insight_types::voice::{VoiceModel, VoiceProfile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::RwLock;

/// Maximum text input size for TTS (64 KiB).
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Speaks interview questions, one voice profile per language.
#[derive(Debug, Clone)]
pub struct TtsService {
    profiles: Arc<RwLock<HashMap<String, VoiceProfile>>>,
    voices_dir: PathBuf,
    piper_binary: PathBuf,
    espeak_binary: PathBuf,
}

impl TtsService {
    pub fn new(voices_dir: impl AsRef<Path>, piper_binary: impl AsRef<Path>) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            voices_dir: voices_dir.as_ref().to_path_buf(),
            piper_binary: piper_binary.as_ref().to_path_buf(),
            espeak_binary: PathBuf::from("espeak-ng"),
        }
    }

    pub fn with_espeak_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.espeak_binary = binary.as_ref().to_path_buf();
        self
    }

    /// Registers `profile` for its language, replacing any previous one.
    pub async fn add_profile(&self, profile: VoiceProfile) {
        let language = normalize_language(&profile.language);
        self.profiles.write().await.insert(language, profile);
    }

    /// The profile for `language`. A regional tag such as `ja-JP` falls back to
    /// the bare language when no exact match exists.
    pub async fn get_profile(&self, language: &str) -> Option<VoiceProfile> {
        let profiles = self.profiles.read().await;
        let exact = normalize_language(language);
        if let Some(profile) = profiles.get(&exact) {
            return Some(profile.clone());
        }
        let base = exact.split('-').next().unwrap_or(exact.as_str());
        profiles.get(base).cloned()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.voices_dir.join(path)
        }
    }

    async fn synthesize_piper(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<SynthesizedAudio, VoiceError> {
        let model_path = self.resolve(&profile.model_path);
        if !model_path.exists() {
            return Err(VoiceError::Tts(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        if profile.speed < 0.1 || profile.speed > 10.0 {
            return Err(VoiceError::Config(
                "Speed must be between 0.1 and 10.0".to_string(),
            ));
        }

        let mut command = Command::new(&self.piper_binary);
        command
            .arg("--model")
            .arg(model_path)
            .arg("--output_raw")
            // Piper takes a length scale, the inverse of speed.
            .arg("--length_scale")
            .arg((1.0 / profile.speed).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(config) = &profile.config_path {
            command.arg("--config").arg(self.resolve(config));
        }

        if let Some(speaker) = profile.speaker_id {
            command.arg("--speaker").arg(speaker.to_string());
        }

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("Failed to spawn piper: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Tts("Failed to open stdin".to_string()))?;
        let text_owned = text.to_string();

        // Written from a separate task so a full stdout pipe cannot deadlock us.
        let write_task = tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("Failed to wait for piper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("Piper failed: {}", stderr)));
        }

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Tts(format!(
                    "Failed to write to piper stdin: {}",
                    e
                )))
            }
            Err(e) => return Err(VoiceError::Tts(format!("Stdin task failed: {}", e))),
        }

        Ok(SynthesizedAudio {
            encoding: AudioEncoding::PcmS16Le {
                sample_rate: profile.sample_rate,
            },
            bytes: output.stdout,
        })
    }

    /// espeak-ng writes a complete WAV file to stdout with `--stdout`.
    async fn synthesize_system(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<SynthesizedAudio, VoiceError> {
        // espeak-ng words per minute; 175 is its default rate.
        let rate = (175.0 * profile.speed.clamp(0.5, 3.0)).round() as u32;

        let mut command = Command::new(&self.espeak_binary);
        command
            .arg("-v")
            .arg(&profile.language)
            .arg("-s")
            .arg(rate.to_string())
            .arg("--stdout")
            .arg(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("Failed to spawn espeak-ng: {}", e)))?;

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "System TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("Failed to wait for espeak-ng: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("espeak-ng failed: {}", stderr)));
        }

        Ok(SynthesizedAudio {
            encoding: AudioEncoding::Wav,
            bytes: output.stdout,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsService {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, VoiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceError::Tts("text is empty".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let profile = self
            .get_profile(language)
            .await
            .ok_or_else(|| VoiceError::ProfileNotFound(language.to_string()))?;

        let audio = match profile.model {
            VoiceModel::Piper => self.synthesize_piper(text, &profile).await?,
            VoiceModel::System => self.synthesize_system(text, &profile).await?,
        };
        tracing::debug!(
            language,
            engine = ?profile.model,
            bytes = audio.bytes.len(),
            "synthesized speech"
        );
        Ok(audio)
    }
}

fn normalize_language(language: &str) -> String {
    language.trim().replace('_', "-").to_ascii_lowercase()
}
