// Ollama HTTP backend
//
// Talks to a local (or remote) Ollama server:
//   POST /api/generate  — text completion (non-streaming)
//   POST /api/embed     — embeddings
//   POST /api/show      — model existence check
//   POST /api/pull      — model download

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::GenerateRequest;
use super::Backend;
use crate::errors::{AgentError, AgentResult};

/// Longest slice of an error body copied into an error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// Ollama API backend
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    pull_timeout: Duration,
}

impl OllamaBackend {
    /// Create a backend for the server at `base_url` (e.g. `http://localhost:11434`).
    ///
    /// `request_timeout` bounds generate/embed/show calls; `pull_timeout`
    /// bounds model downloads, which routinely take minutes.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        pull_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pull_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        timeout: Option<Duration>,
    ) -> AgentResult<Response> {
        let url = self.url(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::unavailable(format!("POST {url} timed out: {e}"))
            } else {
                AgentError::unavailable(format!("POST {url} failed: {e}"))
            }
        })
    }
}

/// Read a success body and decode it as JSON.
///
/// Non-success statuses mean the backend could not serve the call; an
/// undecodable body means it broke the response contract.
async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> AgentResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AgentError::unavailable(format!("{path}: failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(AgentError::unavailable(format!(
            "{path} returned {status}: {}",
            preview(&body)
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| AgentError::malformed(format!("{path}: invalid JSON ({e}): {}", preview(&body))))
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW).collect()
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn generate(&self, request: &GenerateRequest) -> AgentResult<String> {
        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: OllamaOptions {
                temperature: request.options.temperature,
                top_p: request.options.top_p,
                num_predict: request.options.max_tokens,
            },
        };

        tracing::debug!(model = %request.model, prompt_chars = request.prompt.len(), "ollama generate");
        let response = self.post("/api/generate", &body, None).await?;
        let parsed: OllamaGenerateResponse = read_json("/api/generate", response).await?;

        parsed
            .response
            .ok_or_else(|| AgentError::malformed("/api/generate: missing `response` field"))
    }

    async fn embed(&self, model: &str, input: &str) -> AgentResult<Vec<f32>> {
        let body = OllamaEmbedRequest { model, input };

        let response = self.post("/api/embed", &body, None).await?;
        let parsed: OllamaEmbedResponse = read_json("/api/embed", response).await?;

        parsed
            .embeddings
            .ok_or_else(|| AgentError::malformed("/api/embed: missing `embeddings` field"))?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::malformed("/api/embed: `embeddings` is empty"))
    }

    async fn show(&self, model: &str) -> AgentResult<bool> {
        let body = OllamaModelRequest {
            model,
            stream: None,
        };
        let response = self.post("/api/show", &body, None).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(AgentError::unavailable(format!(
                "/api/show returned {status} for {model}"
            ))),
        }
    }

    async fn pull(&self, model: &str) -> AgentResult<()> {
        let body = OllamaModelRequest {
            model,
            stream: Some(false),
        };
        let response = self
            .post("/api/pull", &body, Some(self.pull_timeout))
            .await?;
        let parsed: OllamaPullResponse = read_json("/api/pull", response).await?;

        if let Some(error) = parsed.error {
            return Err(AgentError::unavailable(format!(
                "/api/pull failed for {model}: {error}"
            )));
        }
        tracing::debug!(model, status = ?parsed.status, "ollama pull finished");
        Ok(())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    /// Ollama's name for the output token cap
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
}

#[derive(Serialize)]
struct OllamaModelRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct OllamaPullResponse {
    status: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn backend_for(server: &Server) -> OllamaBackend {
        OllamaBackend::new(server.url(), Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_response_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(json!({
                "model": "gemma3:4b",
                "prompt": "Translate this",
                "stream": false,
                "options": { "num_predict": 500 }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"gemma3:4b","response":"Vertaal dit","done":true}"#)
            .create_async()
            .await;

        let backend = backend_for(&server);
        let text = backend
            .generate(&GenerateRequest::new("gemma3:4b", "Translate this"))
            .await
            .unwrap();

        assert_eq!(text, "Vertaal dit");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_missing_response_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(r#"{"done":true}"#)
            .create_async()
            .await;

        let err = backend_for(&server)
            .generate(&GenerateRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_generate_invalid_json_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("this is not json")
            .create_async()
            .await;

        let err = backend_for(&server)
            .generate(&GenerateRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_generate_server_error_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let err = backend_for(&server)
            .generate(&GenerateRequest::new("m", "p"))
            .await
            .unwrap_err();
        match err {
            AgentError::BackendUnavailable { reason } => assert!(reason.contains("500")),
            other => panic!("Expected BackendUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Port 9 (discard) is not an HTTP server on test machines
        let backend = OllamaBackend::new(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = backend
            .generate(&GenerateRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_embed_returns_first_vector() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .match_body(Matcher::PartialJson(json!({"model": "m", "input": "hello"})))
            .with_status(200)
            .with_body(r#"{"model":"m","embeddings":[[0.6,0.8],[1.0,0.0]]}"#)
            .create_async()
            .await;

        let vector = backend_for(&server).embed("m", "hello").await.unwrap();
        assert_eq!(vector, vec![0.6, 0.8]);
    }

    #[tokio::test]
    async fn test_embed_empty_list_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_body(r#"{"embeddings":[]}"#)
            .create_async()
            .await;

        let err = backend_for(&server).embed("m", "x").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_embed_missing_key_is_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/embed")
            .with_status(200)
            .with_body(r#"{"model":"m"}"#)
            .create_async()
            .await;

        let err = backend_for(&server).embed("m", "x").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_show_reports_presence() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/show")
            .match_body(Matcher::PartialJson(json!({"model": "present"})))
            .with_status(200)
            .with_body(r#"{"modelfile":"..."}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/api/show")
            .match_body(Matcher::PartialJson(json!({"model": "absent"})))
            .with_status(404)
            .with_body(r#"{"error":"model 'absent' not found"}"#)
            .create_async()
            .await;

        let backend = backend_for(&server);
        assert!(backend.show("present").await.unwrap());
        assert!(!backend.show("absent").await.unwrap());
    }

    #[tokio::test]
    async fn test_pull_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/pull")
            .match_body(Matcher::PartialJson(json!({"model": "m", "stream": false})))
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        backend_for(&server).pull("m").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pull_error_body_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/pull")
            .with_status(200)
            .with_body(r#"{"error":"pull model manifest: file does not exist"}"#)
            .create_async()
            .await;

        let err = backend_for(&server).pull("nope").await.unwrap_err();
        assert!(matches!(err, AgentError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = OllamaBackend::new(
            "http://localhost:11434/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(backend.url("/api/show"), "http://localhost:11434/api/show");
    }
}
