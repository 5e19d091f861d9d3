use serde::Serialize;

/// How synthesized bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AudioEncoding {
    /// A complete RIFF/WAV file.
    Wav,
    /// Headerless signed 16-bit little-endian mono PCM.
    PcmS16Le { sample_rate: u32 },
}

impl AudioEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioEncoding::Wav => "audio/wav",
            AudioEncoding::PcmS16Le { .. } => "audio/L16",
        }
    }

    /// `Content-Type` value, including the rate parameter for raw PCM.
    pub fn content_type(&self) -> String {
        match self {
            AudioEncoding::Wav => self.mime_type().to_string(),
            AudioEncoding::PcmS16Le { sample_rate } => {
                format!("{};rate={};channels=1", self.mime_type(), sample_rate)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub encoding: AudioEncoding,
    pub bytes: Vec<u8>,
}
