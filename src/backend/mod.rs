// Generation / embedding backends
//
// The refinement core only ever talks to a `Backend`. The shipped
// implementation is an Ollama HTTP client; tests plug in scripted ones.

use async_trait::async_trait;

use crate::errors::AgentResult;

pub mod ollama;
pub mod types;

pub use ollama::OllamaBackend;
pub use types::{GenerateRequest, SamplingOptions};

/// Trait for model backends
///
/// Every call is a single request/response exchange with no retries. Timeouts
/// are the implementation's responsibility.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Complete `request.prompt` with `request.model` and return the raw text.
    async fn generate(&self, request: &GenerateRequest) -> AgentResult<String>;

    /// Embed `input` with `model` and return the first embedding vector.
    async fn embed(&self, model: &str, input: &str) -> AgentResult<Vec<f32>>;

    /// Whether `model` is present on the backend.
    async fn show(&self, model: &str) -> AgentResult<bool>;

    /// Ask the backend to provision `model`.
    async fn pull(&self, model: &str) -> AgentResult<()>;

    /// Backend name for log lines (e.g. "ollama")
    fn name(&self) -> &str;
}
