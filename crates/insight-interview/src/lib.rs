//! Phased interview engine.
//!
//! An interview walks through four questioning phases of five user turns each
//! and then produces a structured summary. [`InterviewSession`] holds the
//! state and advances the phase, [`QuestionGenerator`] turns state into model
//! prompts, and [`Interviewer`] glues the two together with report export.

pub mod checks;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod interviewer;
pub mod llm;
pub mod openai;
pub mod phase;
pub mod registry;
pub mod session;
pub mod templates;

pub use config::LlmConfig;
pub use error::{GenerationError, InterviewError};
pub use export::{ExportError, ExportedArtifact, FileExporter, ReportExporter};
pub use generator::QuestionGenerator;
pub use interviewer::{Completion, Interviewer, Reply};
pub use llm::{ChatMessage, ChatRole, ScriptedGenerator, TextGenerator};
pub use openai::OpenAiChatClient;
pub use phase::Phase;
pub use registry::{SessionRegistry, SharedSession};
pub use session::{InterviewSession, TurnOutcome};
pub use templates::PromptTemplates;
