//! Shared types for the Insight interview platform.
//!
//! This crate holds the value types every other crate in the workspace
//! exchanges: who spoke ([`Speaker`]), what was said ([`Turn`],
//! [`Transcript`]), who was interviewed ([`ParticipantProfile`]) and what
//! came out of it ([`InterviewReport`]).
//!
//! It carries no behaviour beyond validation and rendering, so the database
//! layer and the interview core can both depend on it without depending on
//! each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod participant;
mod transcript;
pub mod voice;

pub use participant::{Gender, ParticipantProfile, ProfileError, MAX_PARTICIPANT_AGE};
pub use transcript::Transcript;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The interview subject.
    User,
    /// The interviewing agent.
    Agent,
}

impl Speaker {
    /// Returns the storage label for this speaker.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Agent => "AGENT",
        }
    }

    /// Parses a storage label back into a `Speaker`.
    ///
    /// Returns `None` for unknown labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "USER" => Some(Self::User),
            "AGENT" => Some(Self::Agent),
            _ => None,
        }
    }

    /// Prefix used when the turn is rendered into prompt context.
    pub fn context_prefix(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Agent => "Agent",
        }
    }
}

/// One utterance in an interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }
}

/// The analytical report produced when an interview terminates.
///
/// Built exactly once per session and never modified afterwards; it is handed
/// as-is to the export and persistence collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewReport {
    pub session_id: Uuid,
    pub theme: String,
    pub summary_text: String,
    pub source_transcript: Transcript,
    pub generated_at: DateTime<Utc>,
}

impl InterviewReport {
    /// Non-empty summary lines, trimmed, in order.
    ///
    /// These are the items the exporter numbers.
    pub fn summary_items(&self) -> impl Iterator<Item = &str> {
        self.summary_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_label_round_trip() {
        for speaker in [Speaker::User, Speaker::Agent] {
            assert_eq!(Speaker::from_label(speaker.label()), Some(speaker));
        }
        assert_eq!(Speaker::from_label("SYSTEM"), None);
        assert_eq!(Speaker::from_label("user"), None);
    }

    #[test]
    fn summary_items_skip_blank_lines() {
        let report = InterviewReport {
            session_id: Uuid::new_v4(),
            theme: "music streaming".to_string(),
            summary_text: "1. Catalogue size\n\n   \n2. Price\n3. Offline mode  \n".to_string(),
            source_transcript: Transcript::new(),
            generated_at: Utc::now(),
        };

        let items: Vec<&str> = report.summary_items().collect();
        assert_eq!(items, vec!["1. Catalogue size", "2. Price", "3. Offline mode"]);
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = InterviewReport {
            session_id: Uuid::nil(),
            theme: "coffee".to_string(),
            summary_text: "ok".to_string(),
            source_transcript: Transcript::new(),
            generated_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("summaryText").is_some());
        assert!(json.get("sourceTranscript").is_some());
        assert!(json.get("generatedAt").is_some());
    }
}
