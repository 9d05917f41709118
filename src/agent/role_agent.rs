// Backend-driven role agent — translate, or critique-and-score a round trip

use async_trait::async_trait;
use std::sync::Arc;

use super::profile::AgentProfile;
use super::prompts::{critique_prompt, translation_prompt};
use super::sanitize::ReasoningFilter;
use super::similarity::{cosine_similarity, is_converged};
use super::{Agent, Evaluation};
use crate::backend::{Backend, GenerateRequest, SamplingOptions};
use crate::config::constants::DEFAULT_CONVERGENCE_EPSILON;
use crate::errors::{AgentError, AgentResult};

/// One role in the round trip, bound to a model on a shared backend.
///
/// The same type serves the forward, backward and judge roles; only the
/// profile differs.
pub struct RoleAgent {
    backend: Arc<dyn Backend>,
    profile: AgentProfile,
    sampling: SamplingOptions,
    filter: ReasoningFilter,
    epsilon: f64,
}

impl RoleAgent {
    pub fn new(backend: Arc<dyn Backend>, profile: AgentProfile) -> Self {
        Self {
            backend,
            profile,
            sampling: SamplingOptions::default(),
            filter: ReasoningFilter::default(),
            epsilon: DEFAULT_CONVERGENCE_EPSILON,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_reasoning_filter(mut self, filter: ReasoningFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Similarity tolerance under which `evaluate` skips the critique.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Run the model readiness check, then return the agent.
    pub async fn prepare(self) -> Self {
        ensure_model(self.backend.as_ref(), &self.profile.model_id).await;
        self
    }

    /// Generate with this agent's model and strip reasoning spans.
    ///
    /// An answer that is empty once reasoning is removed is malformed.
    async fn complete(&self, prompt: String) -> AgentResult<String> {
        tracing::debug!(
            role = %self.profile.role,
            model = %self.profile.model_id,
            "Prompt:\n{}",
            prompt
        );
        let request = GenerateRequest::new(self.profile.model_id.clone(), prompt)
            .with_options(self.sampling);
        let raw = self.backend.generate(&request).await?;
        tracing::debug!(role = %self.profile.role, "Raw response:\n{}", raw);
        let cleaned = self.filter.strip(&raw);
        if cleaned.is_empty() {
            return Err(AgentError::malformed(format!(
                "{} model {} returned no text outside reasoning markers",
                self.profile.role, self.profile.model_id
            )));
        }
        Ok(cleaned)
    }
}

#[async_trait]
impl Agent for RoleAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    async fn translate(&self, text: &str, guidance: &str) -> AgentResult<String> {
        if text.trim().is_empty() {
            return Err(AgentError::precondition(format!(
                "{} agent was asked to translate empty text",
                self.profile.role
            )));
        }
        self.complete(translation_prompt(&self.profile, guidance, text))
            .await
    }

    async fn evaluate(
        &self,
        original: &str,
        translation: &str,
        backtranslation: &str,
    ) -> AgentResult<Evaluation> {
        let model = &self.profile.model_id;
        let original_vec = self.backend.embed(model, original).await?;
        let back_vec = self.backend.embed(model, backtranslation).await?;
        let similarity = cosine_similarity(&original_vec, &back_vec)?;

        if is_converged(similarity, self.epsilon) {
            return Ok(Evaluation {
                critique: None,
                similarity,
            });
        }

        let critique = self
            .complete(critique_prompt(
                &self.profile,
                original,
                translation,
                backtranslation,
            ))
            .await?;

        Ok(Evaluation {
            critique: Some(critique),
            similarity,
        })
    }
}

/// Best-effort readiness check: look up `model`, pull it if absent.
///
/// Never fails. A broken backend or a failed pull is logged and then shows
/// up as `BackendUnavailable` on the first real call. Returns whether the
/// model is known to be available.
pub async fn ensure_model(backend: &dyn Backend, model: &str) -> bool {
    match backend.show(model).await {
        Ok(true) => return true,
        Ok(false) => {
            tracing::info!(model, backend = backend.name(), "Model not present, pulling");
        }
        Err(e) => {
            tracing::warn!(model, error = %e, "Model lookup failed, attempting pull");
        }
    }

    match backend.pull(model).await {
        Ok(()) => {
            tracing::info!(model, "Model pulled");
            true
        }
        Err(e) => {
            tracing::warn!(model, error = %e, "Model pull failed");
            false
        }
    }
}
