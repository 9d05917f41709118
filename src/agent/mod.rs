// Role agents — forward translator, back-translator and judge
//
// Every role is a `RoleAgent` over the shared `Backend`. The loop only sees
// the `Agent` trait, so tests can script each role independently.

pub mod profile;
pub mod prompts;
pub mod role_agent;
pub mod sanitize;
pub mod similarity;

pub use profile::{same_language, AgentProfile, Role};
pub use role_agent::{ensure_model, RoleAgent};
pub use sanitize::{strip_reasoning, ReasoningFilter, ReasoningMarkers};
pub use similarity::{check_score, cosine_similarity, is_converged};

use async_trait::async_trait;

use crate::errors::AgentResult;

/// Judge verdict on one round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Improvement note for the forward translator; `None` once converged
    pub critique: Option<String>,
    /// Cosine similarity of original and back-translation, in `[0, 1]`
    pub similarity: f64,
}

/// One participant in the refinement loop.
#[async_trait]
pub trait Agent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    /// Translate `text` from the profile's source to destination language,
    /// following `guidance`.
    async fn translate(&self, text: &str, guidance: &str) -> AgentResult<String>;

    /// Score the round trip and, unless it is perfect, critique it.
    async fn evaluate(
        &self,
        original: &str,
        translation: &str,
        backtranslation: &str,
    ) -> AgentResult<Evaluation>;
}
