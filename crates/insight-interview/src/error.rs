use crate::phase::Phase;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterviewError {
    #[error("interview already complete")]
    SessionClosed,

    #[error("turn text must not be empty")]
    EmptyTurn,

    #[error("operation not allowed in phase {0}")]
    PhaseMismatch(Phase),

    #[error("no user turn is waiting for a reply")]
    NothingToReply,

    /// The previous user turn has no reply yet; request the reply instead of
    /// sending another turn.
    #[error("the previous turn is still waiting for a reply")]
    ReplyPending,

    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),
}

impl InterviewError {
    /// Whether the caller may retry the same step without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InterviewError::GenerationFailed(_))
    }
}

/// Failures reported by a text-generation collaborator.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("text generation is not configured: {0}")]
    NotConfigured(String),

    #[error("request to text generation service failed: {0}")]
    Request(String),

    #[error("text generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("text generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("malformed response from text generation service: {0}")]
    MalformedResponse(String),

    #[error("text generation service returned no text")]
    EmptyResponse,
}

impl GenerationError {
    /// Rate limits, server errors, timeouts and connection failures are worth
    /// another attempt; everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Timeout(_) | GenerationError::Request(_) => true,
            GenerationError::NotConfigured(_)
            | GenerationError::MalformedResponse(_)
            | GenerationError::EmptyResponse => false,
        }
    }
}
