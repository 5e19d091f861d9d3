//! Interview phases and the turn-count transition function.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of user turns spent in each non-terminal phase.
pub const TURNS_PER_PHASE: u32 = 5;

/// One stage of the interview script.
///
/// Variants are declared in interview order, so the derived `Ord` matches the
/// order in which a session moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PersonalAttributes,
    UsageSituation,
    PurchaseIntention,
    CompetitorAnalysis,
    Summary,
}

impl Phase {
    /// All phases in interview order.
    pub const ALL: [Phase; 5] = [
        Phase::PersonalAttributes,
        Phase::UsageSituation,
        Phase::PurchaseIntention,
        Phase::CompetitorAnalysis,
        Phase::Summary,
    ];

    /// Derives the active phase from the number of completed user turns.
    ///
    /// This is the only place the thresholds live. It is total and
    /// order-preserving: a larger `turn_count` never yields an earlier phase,
    /// and deriving from a persisted count gives the same answer as stepping
    /// through every turn.
    pub fn for_turn_count(turn_count: u32) -> Self {
        match turn_count {
            0..=5 => Phase::PersonalAttributes,
            6..=10 => Phase::UsageSituation,
            11..=15 => Phase::PurchaseIntention,
            16..=20 => Phase::CompetitorAnalysis,
            _ => Phase::Summary,
        }
    }

    /// True for the phase in which the summary is produced.
    pub fn is_terminal(self) -> bool {
        self == Phase::Summary
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Phase::PersonalAttributes => Some(Phase::UsageSituation),
            Phase::UsageSituation => Some(Phase::PurchaseIntention),
            Phase::PurchaseIntention => Some(Phase::CompetitorAnalysis),
            Phase::CompetitorAnalysis => Some(Phase::Summary),
            Phase::Summary => None,
        }
    }

    /// Stable snake_case key, used in JSON and configuration.
    pub fn key(self) -> &'static str {
        match self {
            Phase::PersonalAttributes => "personal_attributes",
            Phase::UsageSituation => "usage_situation",
            Phase::PurchaseIntention => "purchase_intention",
            Phase::CompetitorAnalysis => "competitor_analysis",
            Phase::Summary => "summary",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.key() == key)
    }

    /// Human-readable title, announced when the phase starts.
    pub fn title(self) -> &'static str {
        match self {
            Phase::PersonalAttributes => "Profile",
            Phase::UsageSituation => "Usage situation",
            Phase::PurchaseIntention => "Purchase intention",
            Phase::CompetitorAnalysis => "Competitor analysis",
            Phase::Summary => "Summary",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
