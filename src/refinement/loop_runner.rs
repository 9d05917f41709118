// Refinement loop runner — translate, back-translate, score, fold critique in

use std::sync::Arc;

use crate::agent::{check_score, is_converged, same_language, Agent, AgentProfile};
use crate::config::constants::DEFAULT_CONVERGENCE_EPSILON;
use crate::errors::{AgentError, AgentResult};

use super::types::{IterationRecord, LoopFailure, Trace};

/// The round-trip refinement loop.
///
/// Each iteration runs three dependent calls in order:
/// 1. forward translation of the original, under the current guidance
/// 2. back-translation of that result
/// 3. judge evaluation of the round trip
///
/// A critique is appended to the guidance for the next attempt. The loop
/// stops when the similarity converges or the budget runs out, whichever
/// comes first. A judge that returns no critique also ends the run, since the
/// next attempt would see the same guidance. Guidance lives in the loop,
/// never in the agents, so the same agents can be reused across runs.
pub struct RefinementLoop {
    forward: Arc<dyn Agent>,
    backward: Arc<dyn Agent>,
    judge: Arc<dyn Agent>,
    epsilon: f64,
}

impl RefinementLoop {
    pub fn new(forward: Arc<dyn Agent>, backward: Arc<dyn Agent>, judge: Arc<dyn Agent>) -> Self {
        Self {
            forward,
            backward,
            judge,
            epsilon: DEFAULT_CONVERGENCE_EPSILON,
        }
    }

    /// Stop once `1 - similarity <= epsilon`. The default of 0 demands an
    /// exact 1.0. Values outside `[0, 1)` are rejected when the loop runs.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Run the loop over `text`, starting from `base_guidance`.
    ///
    /// On failure the returned [`LoopFailure`] holds every record completed
    /// before the failing call. Precondition failures happen before any agent
    /// is called and carry an empty trace.
    pub async fn run(
        &self,
        text: &str,
        base_guidance: &str,
        max_iterations: usize,
    ) -> Result<Trace, LoopFailure> {
        check_preconditions(
            self.forward.profile(),
            self.backward.profile(),
            self.judge.profile(),
            text,
            max_iterations,
            self.epsilon,
        )
        .map_err(LoopFailure::before_start)?;

        let mut trace = Trace::new();
        let mut guidance = base_guidance.to_string();
        let mut similarity = 0.0;
        let mut settled = false;

        while !settled && trace.len() < max_iterations {
            let iteration = trace.len() + 1;

            let record = match self.iterate(text, iteration, &guidance).await {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(
                        iteration,
                        kind = error.kind(),
                        error = %error,
                        "Refinement iteration failed"
                    );
                    return Err(LoopFailure::new(error, trace));
                }
            };

            tracing::info!(
                iteration,
                max_iterations,
                similarity = record.similarity,
                critiqued = record.critique.is_some(),
                "Iteration complete"
            );

            similarity = record.similarity;
            settled = record.critique.is_none() || is_converged(similarity, self.epsilon);
            guidance.clone_from(&record.guidance_snapshot);
            trace.push(record);
        }

        if !settled {
            tracing::info!(
                iterations = trace.len(),
                similarity,
                "Iteration budget exhausted before convergence"
            );
        }

        Ok(trace)
    }

    /// One forward → backward → judge pass under `guidance`.
    async fn iterate(
        &self,
        text: &str,
        iteration: usize,
        guidance: &str,
    ) -> AgentResult<IterationRecord> {
        let translation = self.forward.translate(text, guidance).await?;
        tracing::debug!(iteration, "Translation: {}", translation);

        // The backward role gets the shared base guidance, not the critiques
        // addressed to the forward translator.
        let backtranslation = self
            .backward
            .translate(&translation, &self.backward.profile().guidance)
            .await?;
        tracing::debug!(iteration, "Back-translation: {}", backtranslation);

        let evaluation = self
            .judge
            .evaluate(text, &translation, &backtranslation)
            .await?;
        let similarity = check_score(evaluation.similarity)?;

        let mut guidance_snapshot = guidance.to_string();
        if let Some(critique) = &evaluation.critique {
            tracing::debug!(iteration, "Critique: {}", critique);
            guidance_snapshot.push('\n');
            guidance_snapshot.push_str(critique);
        }

        Ok(IterationRecord {
            iteration,
            similarity,
            guidance_snapshot,
            translation,
            backtranslation,
            critique: evaluation.critique,
        })
    }
}

/// Validate the role pairing and the loop input.
///
/// The forward and backward agents must mirror each other's languages and the
/// judge must read the same source language as the forward translator.
/// `epsilon` must lie in `[0, 1)`.
pub fn check_preconditions(
    forward: &AgentProfile,
    backward: &AgentProfile,
    judge: &AgentProfile,
    text: &str,
    max_iterations: usize,
    epsilon: f64,
) -> AgentResult<()> {
    if max_iterations == 0 {
        return Err(AgentError::precondition("max_iterations must be at least 1"));
    }
    if !(0.0..1.0).contains(&epsilon) {
        return Err(AgentError::precondition(format!(
            "convergence epsilon must be in [0, 1), got {epsilon}"
        )));
    }
    if text.trim().is_empty() {
        return Err(AgentError::precondition("input text is empty"));
    }
    if !same_language(&forward.dest_lang, &backward.source_lang) {
        return Err(AgentError::precondition(format!(
            "forward agent translates into {} but backward agent reads {}",
            forward.dest_lang, backward.source_lang
        )));
    }
    if !same_language(&backward.dest_lang, &forward.source_lang) {
        return Err(AgentError::precondition(format!(
            "backward agent translates into {} but the original is {}",
            backward.dest_lang, forward.source_lang
        )));
    }
    if !same_language(&judge.source_lang, &forward.source_lang) {
        return Err(AgentError::precondition(format!(
            "judge agent reads {} but the original is {}",
            judge.source_lang, forward.source_lang
        )));
    }
    Ok(())
}
