// Refinement types — IterationRecord, Trace, LoopFailure, RefinementRequest

use serde::{Deserialize, Serialize};

use crate::agent::{is_converged, ReasoningMarkers};
use crate::backend::SamplingOptions;
use crate::config::constants::{
    DEFAULT_BACKWARD_MODEL, DEFAULT_CONVERGENCE_EPSILON, DEFAULT_FORWARD_MODEL,
    DEFAULT_JUDGE_MODEL, DEFAULT_MAX_ITERATIONS,
};
use crate::config::Config;
use crate::errors::AgentError;

/// One pass of the loop. Never modified once it is in a [`Trace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based, contiguous
    pub iteration: usize,
    /// Round-trip similarity in `[0, 1]`
    pub similarity: f64,
    /// Forward guidance after this iteration's critique was folded in
    pub guidance_snapshot: String,
    /// Forward translation produced during this iteration
    pub translation: String,
    /// Back-translation of `translation`
    pub backtranslation: String,
    /// Judge critique; `None` when the round trip converged
    pub critique: Option<String>,
}

/// Ordered, append-only log of one loop run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trace {
    records: Vec<IterationRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: IterationRecord) {
        debug_assert_eq!(record.iteration, self.records.len() + 1);
        self.records.push(record);
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IterationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    /// Translation of the last iteration.
    pub fn final_translation(&self) -> Option<&str> {
        self.last().map(|r| r.translation.as_str())
    }

    /// Guidance as it stood after the last iteration.
    pub fn final_guidance(&self) -> Option<&str> {
        self.last().map(|r| r.guidance_snapshot.as_str())
    }

    /// The quality signal of the run. Reaching 1.0 is not guaranteed.
    pub fn final_similarity(&self) -> Option<f64> {
        self.last().map(|r| r.similarity)
    }

    pub fn converged(&self, epsilon: f64) -> bool {
        self.final_similarity()
            .map(|s| is_converged(s, epsilon))
            .unwrap_or(false)
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a IterationRecord;
    type IntoIter = std::slice::Iter<'a, IterationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A loop run that stopped on an error, with everything recorded up to it.
#[derive(Debug, thiserror::Error)]
#[error("refinement stopped after {} completed iteration(s)", .trace.len())]
pub struct LoopFailure {
    #[source]
    pub error: AgentError,
    /// Records completed before the failure; empty for precondition errors
    pub trace: Trace,
}

impl LoopFailure {
    pub fn new(error: AgentError, trace: Trace) -> Self {
        Self { error, trace }
    }

    pub(crate) fn before_start(error: AgentError) -> Self {
        Self::new(error, Trace::new())
    }
}

/// Model id per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleModels {
    pub forward: String,
    pub backward: String,
    pub judge: String,
}

impl Default for RoleModels {
    fn default() -> Self {
        Self {
            forward: DEFAULT_FORWARD_MODEL.to_string(),
            backward: DEFAULT_BACKWARD_MODEL.to_string(),
            judge: DEFAULT_JUDGE_MODEL.to_string(),
        }
    }
}

/// Everything one call to [`super::refine`] needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementRequest {
    pub text: String,
    pub models: RoleModels,
    /// Shared by all three roles
    pub expertise: String,
    /// Base guidance; the loop grows its own copy
    pub guidance: String,
    pub source_lang: String,
    pub target_lang: String,
    pub max_iterations: usize,
    pub sampling: SamplingOptions,
    pub epsilon: f64,
    pub reasoning: ReasoningMarkers,
}

impl RefinementRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            models: RoleModels::default(),
            expertise: String::new(),
            guidance: String::new(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            sampling: SamplingOptions::default(),
            epsilon: DEFAULT_CONVERGENCE_EPSILON,
            reasoning: ReasoningMarkers::default(),
        }
    }

    /// Request for `text` with every other field taken from `config`.
    pub fn from_config(text: impl Into<String>, config: &Config) -> Self {
        Self {
            text: text.into(),
            models: config.models.clone(),
            expertise: config.run.expertise.clone(),
            guidance: config.run.guidance.clone(),
            source_lang: config.run.source_lang.clone(),
            target_lang: config.run.target_lang.clone(),
            max_iterations: config.run.max_iterations,
            sampling: config.sampling,
            epsilon: config.run.convergence_epsilon,
            reasoning: config.reasoning.clone(),
        }
    }

    pub fn with_models(mut self, models: RoleModels) -> Self {
        self.models = models;
        self
    }

    pub fn with_expertise(mut self, expertise: impl Into<String>) -> Self {
        self.expertise = expertise.into();
        self
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_reasoning(mut self, reasoning: ReasoningMarkers) -> Self {
        self.reasoning = reasoning;
        self
    }
}
