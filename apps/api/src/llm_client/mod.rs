/// LLM Client — the single point of entry for all generative-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the Generative Language API
/// directly. All model interactions MUST go through `ModelInvoker`.
///
/// The trait is the test seam: handlers and the pipeline only ever see
/// `dyn ModelInvoker`, so a deterministic stub replaces the network in tests.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GENERATIVE_LANGUAGE_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
/// Default model for all analysis calls.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("model credential rejected (status {status})")]
    Auth { status: u16 },

    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned no response content")]
    EmptyContent,
}

impl InvocationError {
    /// Transport failures and 429/5xx are worth retrying; credential and
    /// other client errors are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            InvocationError::Http(_) => true,
            InvocationError::Api { status, .. } => *status == 429 || *status >= 500,
            InvocationError::Auth { .. } | InvocationError::EmptyContent => false,
        }
    }
}

/// Narrow capability interface for the external model service:
/// prompt in, raw response text out.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Extracts the text of the first candidate's first text part.
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.text.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the Generative Language API. One instance per process,
/// injected wherever a `ModelInvoker` is needed.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ModelInvoker for GeminiClient {
    /// Makes a single call to the model. No retry here: retry policy lives
    /// in `RetryingInvoker`, composed at startup when configured.
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let url = format!(
            "{GENERATIVE_LANGUAGE_API_URL}/{}:generateContent",
            self.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(InvocationError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(InvocationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text().ok_or(InvocationError::EmptyContent)?;

        debug!("model call succeeded ({} chars)", text.len());
        Ok(text.to_string())
    }
}

/// Decorator adding exponential-backoff retry (1s, 2s, 4s, ...) around any
/// invoker for transient failures. The wrapped invoker stays retry-free.
pub struct RetryingInvoker<I> {
    inner: I,
    max_retries: u32,
}

impl<I: ModelInvoker> RetryingInvoker<I> {
    pub fn new(inner: I, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }
}

#[async_trait]
impl<I: ModelInvoker> ModelInvoker for RetryingInvoker<I> {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError> {
        let mut attempt = 0;
        loop {
            match self.inner.invoke(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                    warn!(
                        "model call failed ({e}), retry {attempt}/{} after {}ms",
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "[{\"score\": 90}]"}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("[{\"score\": 90}]"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_response_with_empty_parts_has_no_text() {
        let json = r#"{"candidates": [{"content": {"parts": []}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_api_error_body_parsing() {
        let body = r#"{"error": {"message": "API key not valid", "code": 400}}"#;
        let envelope: ApiErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "API key not valid");
    }

    #[test]
    fn test_retryability_classification() {
        assert!(InvocationError::Api {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(InvocationError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!InvocationError::Api {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!InvocationError::Auth { status: 403 }.is_retryable());
        assert!(!InvocationError::EmptyContent.is_retryable());
    }

    /// Fails `failures` times with a retryable error, then succeeds.
    struct FlakyInvoker {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ModelInvoker for FlakyInvoker {
        async fn invoke(&self, _prompt: &str) -> Result<String, InvocationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(InvocationError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                })
            } else {
                Ok("ok".to_string())
            }
        }
    }

    struct AlwaysAuthError;

    #[async_trait]
    impl ModelInvoker for AlwaysAuthError {
        async fn invoke(&self, _prompt: &str) -> Result<String, InvocationError> {
            Err(InvocationError::Auth { status: 401 })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrying_invoker_recovers_from_transient_failures() {
        let invoker = RetryingInvoker::new(
            FlakyInvoker {
                failures: 2,
                calls: AtomicU32::new(0),
            },
            3,
        );
        let result = invoker.invoke("prompt").await.unwrap();
        assert_eq!(result, "ok");
        assert_eq!(invoker.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrying_invoker_gives_up_after_max_retries() {
        let invoker = RetryingInvoker::new(
            FlakyInvoker {
                failures: 10,
                calls: AtomicU32::new(0),
            },
            2,
        );
        let result = invoker.invoke("prompt").await;
        assert!(matches!(result, Err(InvocationError::Api { .. })));
        // Initial attempt plus two retries.
        assert_eq!(invoker.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retrying_invoker_does_not_retry_auth_errors() {
        let invoker = RetryingInvoker::new(AlwaysAuthError, 5);
        let result = invoker.invoke("prompt").await;
        assert!(matches!(result, Err(InvocationError::Auth { status: 401 })));
    }
}
