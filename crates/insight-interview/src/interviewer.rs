//! Drives one agent reply per user turn.
//!
//! [`Interviewer::respond`] is the only place a generated reply is written
//! back into a session. It records nothing until the collaborator has
//! answered, so a failed call leaves the session exactly as it was: the user
//! turn stays recorded and can be answered by calling `respond` again.

use insight_types::InterviewReport;
use std::sync::Arc;

use crate::checks::{count_enumerated_sections, count_questions, EXPECTED_SUMMARY_SECTIONS};
use crate::error::InterviewError;
use crate::export::{ExportedArtifact, ReportExporter};
use crate::generator::QuestionGenerator;
use crate::phase::Phase;
use crate::session::InterviewSession;

/// What the agent says back after a user turn.
#[derive(Debug, Clone)]
pub enum Reply {
    /// The next interview question.
    Question { text: String, phase: Phase },
    /// The interview is over.
    Completed(Completion),
}

/// Outcome of the terminal step.
#[derive(Debug, Clone)]
pub struct Completion {
    pub report: InterviewReport,
    pub artifact: Option<ExportedArtifact>,
    /// Set when the export collaborator failed. The report is still valid.
    pub export_error: Option<String>,
    pub closing: String,
}

#[derive(Clone)]
pub struct Interviewer {
    generator: QuestionGenerator,
    exporter: Option<Arc<dyn ReportExporter>>,
}

impl Interviewer {
    pub fn new(generator: QuestionGenerator, exporter: Arc<dyn ReportExporter>) -> Self {
        Self {
            generator,
            exporter: Some(exporter),
        }
    }

    /// An interviewer whose completed reports are kept but never written out.
    pub fn without_export(generator: QuestionGenerator) -> Self {
        Self {
            generator,
            exporter: None,
        }
    }

    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    /// The fixed message shown before the first question.
    pub fn introduction(&self) -> &str {
        &self.generator.templates().introduction
    }

    /// Asks the opening question of a fresh session.
    ///
    /// Returns `Ok(None)` if the session already has turns.
    pub async fn start(
        &self,
        session: &mut InterviewSession,
    ) -> Result<Option<String>, InterviewError> {
        if session.is_terminated() {
            return Err(InterviewError::SessionClosed);
        }
        if !session.transcript().is_empty() {
            return Ok(None);
        }
        let question = self.generator.opening_question(session.theme()).await?;
        session.record_agent_turn(&question)?;
        tracing::info!(session_id = %session.id(), theme = session.theme(), "interview started");
        Ok(Some(question))
    }

    /// Produces the reply to the pending user turn.
    pub async fn respond(&self, session: &mut InterviewSession) -> Result<Reply, InterviewError> {
        if session.is_terminated() {
            return Err(InterviewError::SessionClosed);
        }
        if !session.awaits_reply() {
            return Err(InterviewError::NothingToReply);
        }

        if session.is_terminal() {
            return self.finish(session).await.map(Reply::Completed);
        }

        let phase = session.phase();
        let question = self
            .generator
            .next_question(phase, session.theme(), &session.context(), session.transcript())
            .await?;

        let questions = count_questions(&question);
        if questions != 1 {
            tracing::warn!(
                session_id = %session.id(),
                %phase,
                questions,
                "model reply does not contain exactly one question"
            );
        }

        session.record_agent_turn(&question)?;
        Ok(Reply::Question {
            text: question,
            phase,
        })
    }

    async fn finish(&self, session: &mut InterviewSession) -> Result<Completion, InterviewError> {
        let summary = self
            .generator
            .summarize(session.theme(), &session.context())
            .await?;

        let sections = count_enumerated_sections(&summary);
        if sections != EXPECTED_SUMMARY_SECTIONS {
            tracing::warn!(
                session_id = %session.id(),
                sections,
                expected = EXPECTED_SUMMARY_SECTIONS,
                "summary does not have the expected number of sections"
            );
        }

        let report = session.complete(&summary)?;

        let (artifact, export_error) = match &self.exporter {
            Some(exporter) => match exporter.export(&report).await {
                Ok(artifact) => (Some(artifact), None),
                Err(e) => {
                    tracing::warn!(session_id = %report.session_id, error = %e, "report export failed");
                    (None, Some(e.to_string()))
                }
            },
            None => (None, None),
        };

        Ok(Completion {
            report,
            artifact,
            export_error,
            closing: self.generator.templates().closing.clone(),
        })
    }
}
