// Error types for role agents and the refinement loop
//
// Every failure is surfaced immediately; nothing in the core retries.

/// Failure raised by a role agent, a backend call, or the loop's own checks.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The generation or embedding service could not be reached, timed out,
    /// or answered with a non-success status.
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// The backend answered, but the body is not what the contract promises.
    #[error("malformed backend response: {reason}")]
    MalformedResponse { reason: String },

    /// A similarity score fell outside `[0.0, 1.0]`.
    #[error("similarity score {score} is outside [0.0, 1.0]")]
    ScoreOutOfRange { score: f64 },

    /// Invalid loop input, detected before any backend call.
    #[error("precondition violated: {reason}")]
    PreconditionViolation { reason: String },
}

impl AgentError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            reason: reason.into(),
        }
    }

    /// Short machine-friendly tag, used in logs and batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::ScoreOutOfRange { .. } => "score_out_of_range",
            Self::PreconditionViolation { .. } => "precondition_violation",
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
