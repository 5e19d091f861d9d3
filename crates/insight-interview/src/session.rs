//! The interview session aggregate and its phase controller operations.
//!
//! An [`InterviewSession`] owns everything that changes during an interview:
//! the transcript, the user turn counter and the terminated flag. The phase is
//! never stored independently of the counter; every mutation goes through
//! [`Phase::for_turn_count`].

use chrono::{DateTime, Utc};
use insight_types::{InterviewReport, ParticipantProfile, Speaker, Transcript, Turn};
use uuid::Uuid;

use crate::error::InterviewError;
use crate::phase::Phase;

/// Result of recording a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    pub previous_phase: Phase,
    pub phase: Phase,
    pub turn_count: u32,
}

impl TurnOutcome {
    /// True when this turn moved the interview into a new phase.
    pub fn phase_changed(&self) -> bool {
        self.previous_phase != self.phase
    }
}

/// State of a single interview.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    id: Uuid,
    theme: String,
    participant: Option<ParticipantProfile>,
    turn_count: u32,
    phase: Phase,
    transcript: Transcript,
    terminated: bool,
    created_at: DateTime<Utc>,
}

impl InterviewSession {
    /// Starts a fresh interview about `theme`.
    pub fn new(theme: impl Into<String>, participant: Option<ParticipantProfile>) -> Self {
        Self {
            id: Uuid::new_v4(),
            theme: theme.into(),
            participant,
            turn_count: 0,
            phase: Phase::for_turn_count(0),
            transcript: Transcript::new(),
            terminated: false,
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a session from persisted state.
    ///
    /// The turn counter is recounted from the transcript and the phase is
    /// derived from it, so a restored session is indistinguishable from the
    /// one that was persisted.
    pub fn restore(
        id: Uuid,
        theme: impl Into<String>,
        participant: Option<ParticipantProfile>,
        transcript: Transcript,
        terminated: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let turn_count = transcript.user_turn_count();
        Self {
            id,
            theme: theme.into(),
            participant,
            turn_count,
            phase: Phase::for_turn_count(turn_count),
            transcript,
            terminated,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn participant(&self) -> Option<&ParticipantProfile> {
        self.participant.as_ref()
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True once the questioning is over and only the summary remains.
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// True when the last turn came from the user and has not been answered,
    /// e.g. after a failed generation.
    pub fn awaits_reply(&self) -> bool {
        !self.terminated
            && self
                .transcript
                .last()
                .is_some_and(|turn| turn.speaker == Speaker::User)
    }

    /// Records one subject utterance and advances the phase.
    ///
    /// Rejected with [`InterviewError::SessionClosed`] once the session has
    /// terminated or reached the summary phase, and with
    /// [`InterviewError::ReplyPending`] while the previous user turn is still
    /// unanswered. The transcript is untouched in both cases.
    pub fn record_user_turn(&mut self, text: &str) -> Result<TurnOutcome, InterviewError> {
        if self.terminated || self.phase.is_terminal() {
            return Err(InterviewError::SessionClosed);
        }
        if self.awaits_reply() {
            return Err(InterviewError::ReplyPending);
        }
        let text = non_empty(text)?;

        let previous_phase = self.phase;
        self.transcript.push(Turn::user(text));
        self.turn_count += 1;
        self.phase = Phase::for_turn_count(self.turn_count);

        tracing::debug!(
            session_id = %self.id,
            turn_count = self.turn_count,
            phase = %self.phase,
            "recorded user turn"
        );

        Ok(TurnOutcome {
            previous_phase,
            phase: self.phase,
            turn_count: self.turn_count,
        })
    }

    /// Records one agent utterance. The phase does not move.
    pub fn record_agent_turn(&mut self, text: &str) -> Result<(), InterviewError> {
        if self.terminated {
            return Err(InterviewError::SessionClosed);
        }
        let text = non_empty(text)?;
        self.transcript.push(Turn::agent(text));
        Ok(())
    }

    /// The prompt context: the participant line, if any, followed by the
    /// transcript lines.
    pub fn context(&self) -> String {
        let transcript = self.transcript.render_context();
        match &self.participant {
            Some(profile) => format!("{}\n{}", profile.context_line(), transcript),
            None => transcript,
        }
    }

    /// Closes the session with the generated summary and returns the report.
    ///
    /// Happens at most once; a second call fails with
    /// [`InterviewError::SessionClosed`].
    pub fn complete(&mut self, summary_text: &str) -> Result<InterviewReport, InterviewError> {
        if self.terminated {
            return Err(InterviewError::SessionClosed);
        }
        if !self.phase.is_terminal() {
            return Err(InterviewError::PhaseMismatch(self.phase));
        }
        let summary_text = non_empty(summary_text)?;

        self.terminated = true;
        tracing::info!(session_id = %self.id, turn_count = self.turn_count, "interview completed");

        Ok(InterviewReport {
            session_id: self.id,
            theme: self.theme.clone(),
            summary_text: summary_text.to_string(),
            source_transcript: self.transcript.clone(),
            generated_at: Utc::now(),
        })
    }
}

fn non_empty(text: &str) -> Result<&str, InterviewError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(InterviewError::EmptyTurn)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_types::Gender;

    fn session() -> InterviewSession {
        InterviewSession::new("music streaming", None)
    }

    fn advance_to_summary(session: &mut InterviewSession) {
        for i in 1..=20 {
            session
                .record_user_turn(&format!("answer {i}"))
                .expect("turn should be accepted");
            session.record_agent_turn(&format!("question {i}")).unwrap();
        }
        session.record_user_turn("answer 21").unwrap();
    }

    #[test]
    fn new_session_starts_in_personal_attributes() {
        let s = session();
        assert_eq!(s.turn_count(), 0);
        assert_eq!(s.phase(), Phase::PersonalAttributes);
        assert!(s.transcript().is_empty());
        assert!(!s.is_terminated());
        assert!(!s.awaits_reply());
    }

    #[test]
    fn turn_count_is_monotonic() {
        let mut s = session();
        let mut last = s.turn_count();
        for i in 0..21 {
            s.record_user_turn(&format!("a{i}")).unwrap();
            s.record_agent_turn(&format!("q{i}")).ok();
            assert!(s.turn_count() > last);
            last = s.turn_count();
        }
        // Rejected turns leave the count alone.
        assert!(s.record_user_turn("late").is_err());
        assert_eq!(s.turn_count(), last);
    }

    #[test]
    fn agent_turns_do_not_advance_phase() {
        let mut s = session();
        for _ in 0..5 {
            s.record_user_turn("answer").unwrap();
            s.record_agent_turn("question").unwrap();
        }
        for _ in 0..5 {
            s.record_agent_turn("follow-up").unwrap();
        }
        assert_eq!(s.turn_count(), 5);
        assert_eq!(s.phase(), Phase::PersonalAttributes);
    }

    #[test]
    fn outcome_reports_phase_change() {
        let mut s = session();
        for _ in 0..4 {
            assert!(!s.record_user_turn("a").unwrap().phase_changed());
            s.record_agent_turn("q").unwrap();
        }
        // Turn 5 stays in the first phase, turn 6 crosses into the next.
        assert!(!s.record_user_turn("a").unwrap().phase_changed());
        s.record_agent_turn("q").unwrap();
        let outcome = s.record_user_turn("a").unwrap();
        assert!(outcome.phase_changed());
        assert_eq!(outcome.previous_phase, Phase::PersonalAttributes);
        assert_eq!(outcome.phase, Phase::UsageSituation);
        assert_eq!(outcome.turn_count, 6);
    }

    #[test]
    fn transcript_keeps_call_order_and_speakers() {
        let mut s = session();
        s.record_agent_turn("q1").unwrap();
        s.record_user_turn("a1").unwrap();
        s.record_agent_turn("q2").unwrap();
        s.record_user_turn("a2").unwrap();

        let turns = s.transcript().turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], Turn::agent("q1"));
        assert_eq!(turns[1], Turn::user("a1"));
        assert_eq!(turns[2], Turn::agent("q2"));
        assert_eq!(turns[3], Turn::user("a2"));
    }

    #[test]
    fn blank_turns_are_rejected_without_recording() {
        let mut s = session();
        assert!(matches!(
            s.record_user_turn("   \n"),
            Err(InterviewError::EmptyTurn)
        ));
        assert!(matches!(s.record_agent_turn(""), Err(InterviewError::EmptyTurn)));
        assert!(s.transcript().is_empty());
        assert_eq!(s.turn_count(), 0);
    }

    #[test]
    fn summary_phase_refuses_more_user_turns() {
        let mut s = session();
        advance_to_summary(&mut s);
        assert!(s.is_terminal());
        let before = s.transcript().clone();

        assert!(matches!(
            s.record_user_turn("one more thing"),
            Err(InterviewError::SessionClosed)
        ));
        assert_eq!(s.transcript(), &before);
    }

    #[test]
    fn complete_closes_the_session_once() {
        let mut s = session();
        advance_to_summary(&mut s);

        let report = s.complete("1. a\n2. b").unwrap();
        assert!(s.is_terminated());
        assert_eq!(report.session_id, s.id());
        assert_eq!(report.theme, "music streaming");
        assert_eq!(report.source_transcript.len(), 41);

        assert!(matches!(
            s.complete("again"),
            Err(InterviewError::SessionClosed)
        ));
        assert!(matches!(
            s.record_user_turn("hello?"),
            Err(InterviewError::SessionClosed)
        ));
        assert!(matches!(
            s.record_agent_turn("hello?"),
            Err(InterviewError::SessionClosed)
        ));
        assert_eq!(s.transcript().len(), 41);
    }

    #[test]
    fn complete_before_summary_phase_is_a_phase_mismatch() {
        let mut s = session();
        s.record_user_turn("a").unwrap();
        assert!(matches!(
            s.complete("too early"),
            Err(InterviewError::PhaseMismatch(Phase::PersonalAttributes))
        ));
        assert!(!s.is_terminated());
    }

    #[test]
    fn unanswered_turn_blocks_the_next_one() {
        let mut s = session();
        s.record_agent_turn("What should I call you?").unwrap();
        s.record_user_turn("Ken.").unwrap();
        let before = s.transcript().clone();

        // Five more answers would cross into the next phase if accepted.
        for _ in 0..5 {
            assert!(matches!(
                s.record_user_turn("hello?"),
                Err(InterviewError::ReplyPending)
            ));
        }
        assert_eq!(s.turn_count(), 1);
        assert_eq!(s.phase(), Phase::PersonalAttributes);
        assert_eq!(s.transcript(), &before);

        s.record_agent_turn("How old are you?").unwrap();
        assert_eq!(s.record_user_turn("41.").unwrap().turn_count, 2);
    }

    #[test]
    fn awaits_reply_tracks_the_last_speaker() {
        let mut s = session();
        s.record_agent_turn("q").unwrap();
        assert!(!s.awaits_reply());
        s.record_user_turn("a").unwrap();
        assert!(s.awaits_reply());
        s.record_agent_turn("q").unwrap();
        assert!(!s.awaits_reply());
    }

    #[test]
    fn restore_rederives_count_and_phase() {
        let mut original = session();
        for i in 0..13 {
            original.record_agent_turn(&format!("q{i}")).unwrap();
            original.record_user_turn(&format!("a{i}")).unwrap();
        }

        let restored = InterviewSession::restore(
            original.id(),
            original.theme(),
            None,
            original.transcript().clone(),
            false,
            original.created_at(),
        );

        assert_eq!(restored.turn_count(), original.turn_count());
        assert_eq!(restored.phase(), original.phase());
        assert_eq!(restored.phase(), Phase::PurchaseIntention);
        assert!(restored.awaits_reply());
    }

    #[test]
    fn context_starts_with_participant_line() {
        let profile = ParticipantProfile {
            display_name: "Aki".to_string(),
            age: 29,
            gender: Gender::Other,
            occupation: "designer".to_string(),
            email: None,
        };
        let mut s = InterviewSession::new("coffee", Some(profile));
        s.record_agent_turn("What should I call you?").unwrap();
        s.record_user_turn("Aki is fine.").unwrap();

        assert_eq!(
            s.context(),
            "Participant: name=Aki, age=29, gender=other, occupation=designer\n\
             Agent: What should I call you?\nUser: Aki is fine.\n"
        );
    }
}
