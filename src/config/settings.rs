// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::*;
use crate::agent::ReasoningMarkers;
use crate::backend::{OllamaBackend, SamplingOptions};
use crate::refinement::RoleModels;

/// Top-level configuration, as read from `config.toml`.
///
/// Every section is optional; missing keys fall back to the defaults in
/// [`super::constants`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the models are served
    pub backend: BackendSettings,

    /// Sampling parameters shared by all three roles
    pub sampling: SamplingOptions,

    /// Model id per role
    pub models: RoleModels,

    /// Languages, domain and loop budget
    pub run: RunSettings,

    /// Markers delimiting inline model deliberation
    pub reasoning: ReasoningMarkers,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Ollama base URL (overridden by `OLLAMA_HOST`)
    pub base_url: String,
    /// Timeout for generate / embed / show calls
    pub request_timeout_secs: u64,
    /// Timeout for model downloads
    pub pull_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            pull_timeout_secs: DEFAULT_PULL_TIMEOUT_SECS,
        }
    }
}

/// Per-run defaults; each can be overridden on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub source_lang: String,
    pub target_lang: String,
    /// Domain the translators are experts in (e.g. "survey design")
    pub expertise: String,
    /// Base instructions given to every role
    pub guidance: String,
    /// Iteration budget per input text
    pub max_iterations: usize,
    /// Tolerance below 1.0 still counted as converged
    pub convergence_epsilon: f64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            expertise: String::new(),
            guidance: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence_epsilon: DEFAULT_CONVERGENCE_EPSILON,
        }
    }
}

impl Config {
    /// Validate configuration and return helpful errors
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            bail!("backend.base_url must not be empty");
        }
        if self.backend.request_timeout_secs == 0 {
            bail!("backend.request_timeout_secs must be greater than 0");
        }
        if self.backend.pull_timeout_secs == 0 {
            bail!("backend.pull_timeout_secs must be greater than 0");
        }

        if self.sampling.temperature < 0.0 {
            bail!("sampling.temperature must be >= 0 (got {})", self.sampling.temperature);
        }
        if !(self.sampling.top_p > 0.0 && self.sampling.top_p <= 1.0) {
            bail!("sampling.top_p must be in (0, 1] (got {})", self.sampling.top_p);
        }
        if self.sampling.max_tokens == 0 {
            bail!("sampling.max_tokens must be greater than 0");
        }

        for (role, model) in [
            ("forward", &self.models.forward),
            ("backward", &self.models.backward),
            ("judge", &self.models.judge),
        ] {
            if model.trim().is_empty() {
                bail!("models.{role} must not be empty");
            }
        }

        if self.run.source_lang.trim().is_empty() || self.run.target_lang.trim().is_empty() {
            bail!("run.source_lang and run.target_lang must not be empty");
        }
        if self.run.max_iterations == 0 {
            bail!("run.max_iterations must be at least 1");
        }
        if !(0.0..1.0).contains(&self.run.convergence_epsilon) {
            bail!(
                "run.convergence_epsilon must be in [0, 1) (got {})",
                self.run.convergence_epsilon
            );
        }

        self.reasoning.validate()?;

        Ok(())
    }

    /// Build the HTTP backend described by `[backend]`.
    pub fn build_backend(&self) -> Result<OllamaBackend> {
        OllamaBackend::new(
            self.backend.base_url.clone(),
            Duration::from_secs(self.backend.request_timeout_secs),
            Duration::from_secs(self.backend.pull_timeout_secs),
        )
    }
}
