//! Question and summary generation.
//!
//! The generator is stateless: it turns (phase, theme, context) into a prompt,
//! sends it to the [`TextGenerator`] and hands back the text. Recording the
//! reply is the caller's job, which is what keeps a failed call from leaving a
//! half-written turn behind.

use insight_types::{Speaker, Transcript};
use std::sync::Arc;

use crate::error::{GenerationError, InterviewError};
use crate::llm::{ChatMessage, TextGenerator};
use crate::phase::Phase;
use crate::templates::PromptTemplates;

#[derive(Clone)]
pub struct QuestionGenerator {
    llm: Arc<dyn TextGenerator>,
    templates: PromptTemplates,
}

impl std::fmt::Debug for QuestionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionGenerator")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl QuestionGenerator {
    /// Builds a generator, rejecting templates that are missing placeholders.
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        templates: PromptTemplates,
    ) -> Result<Self, InterviewError> {
        templates.validate()?;
        Ok(Self { llm, templates })
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Messages for the next question: the filled phase template as the only
    /// system instruction, followed by the transcript as chat history.
    pub fn question_prompt(
        &self,
        phase: Phase,
        theme: &str,
        context: &str,
        history: &Transcript,
    ) -> Result<Vec<ChatMessage>, InterviewError> {
        if phase.is_terminal() {
            return Err(InterviewError::PhaseMismatch(phase));
        }
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(
            self.templates.render(phase, theme, context),
        ));
        messages.extend(history.iter().map(|turn| match turn.speaker {
            Speaker::User => ChatMessage::user(&turn.text),
            Speaker::Agent => ChatMessage::assistant(&turn.text),
        }));
        Ok(messages)
    }

    /// Messages for the summary: the filled summary template alone.
    pub fn summary_prompt(&self, theme: &str, context: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(
            self.templates.render(Phase::Summary, theme, context),
        )]
    }

    /// Asks for the next interview question.
    pub async fn next_question(
        &self,
        phase: Phase,
        theme: &str,
        context: &str,
        history: &Transcript,
    ) -> Result<String, InterviewError> {
        let messages = self.question_prompt(phase, theme, context, history)?;
        self.call(&messages).await
    }

    /// Asks for the first question of an interview, before the subject has
    /// said anything.
    pub async fn opening_question(&self, theme: &str) -> Result<String, InterviewError> {
        let messages = vec![ChatMessage::system(self.templates.render(
            Phase::PersonalAttributes,
            theme,
            &self.templates.opening,
        ))];
        self.call(&messages).await
    }

    /// Asks for the six-point analysis report.
    pub async fn summarize(&self, theme: &str, context: &str) -> Result<String, InterviewError> {
        let messages = self.summary_prompt(theme, context);
        self.call(&messages).await
    }

    async fn call(&self, messages: &[ChatMessage]) -> Result<String, InterviewError> {
        let text = self.llm.generate(messages).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        Ok(text.to_string())
    }
}
