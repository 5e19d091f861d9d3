//! Interview participant profile.
//!
//! Collected before an interview starts. When present it is rendered as the
//! first line of the prompt context so the agent does not re-ask basic
//! demographics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound accepted for [`ParticipantProfile::age`].
pub const MAX_PARTICIPANT_AGE: u8 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Demographic details about the interview subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    pub display_name: String,
    pub age: u8,
    pub gender: Gender,
    pub occupation: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Reasons a profile is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("age must be between 1 and {MAX_PARTICIPANT_AGE}, got {0}")]
    AgeOutOfRange(u8),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

impl ParticipantProfile {
    /// Checks that every required field is filled in.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.display_name.trim().is_empty() {
            return Err(ProfileError::MissingField("displayName"));
        }
        if self.occupation.trim().is_empty() {
            return Err(ProfileError::MissingField("occupation"));
        }
        if self.age == 0 || self.age > MAX_PARTICIPANT_AGE {
            return Err(ProfileError::AgeOutOfRange(self.age));
        }
        if let Some(email) = &self.email {
            let trimmed = email.trim();
            if !trimmed.is_empty() && !trimmed.contains('@') {
                return Err(ProfileError::InvalidEmail(email.clone()));
            }
        }
        Ok(())
    }

    /// The line prepended to the prompt context.
    pub fn context_line(&self) -> String {
        format!(
            "Participant: name={}, age={}, gender={}, occupation={}",
            self.display_name.trim(),
            self.age,
            self.gender.label(),
            self.occupation.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ParticipantProfile {
        ParticipantProfile {
            display_name: "Aki".to_string(),
            age: 34,
            gender: Gender::Female,
            occupation: "nurse".to_string(),
            email: None,
        }
    }

    #[test]
    fn complete_profile_is_valid() {
        assert_eq!(profile().validate(), Ok(()));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut p = profile();
        p.display_name = "  ".to_string();
        assert_eq!(p.validate(), Err(ProfileError::MissingField("displayName")));
    }

    #[test]
    fn age_bounds() {
        let mut p = profile();
        p.age = 0;
        assert_eq!(p.validate(), Err(ProfileError::AgeOutOfRange(0)));
        p.age = 121;
        assert_eq!(p.validate(), Err(ProfileError::AgeOutOfRange(121)));
        p.age = 120;
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        let mut p = profile();
        p.email = Some("aki.example.com".to_string());
        assert!(matches!(p.validate(), Err(ProfileError::InvalidEmail(_))));
    }

    #[test]
    fn context_line_lists_demographics() {
        assert_eq!(
            profile().context_line(),
            "Participant: name=Aki, age=34, gender=female, occupation=nurse"
        );
    }
}
