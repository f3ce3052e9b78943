//! Multi-provider AI client for knowledge summaries and key selection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::{AiConfig, ProviderKind};

use super::prompts::{format_summary_request, SELECTION_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT};

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with proper timeout configuration.
fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        })
}

/// Determine if a request should be retried based on status code and attempt count.
fn should_retry(status_code: u16, attempt: u32, max_retries: u32) -> bool {
    if attempt >= max_retries {
        return false;
    }
    // Retry on 5xx server errors
    (500..600).contains(&status_code)
}

/// Calculate exponential backoff duration for retry attempts.
fn calculate_backoff(attempt: u32) -> Duration {
    // Exponential backoff: 1s, 2s, 4s
    Duration::from_secs(1 << attempt)
}

/// Errors from AI client operations.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("API key not configured (env: {0})")]
    MissingApiKey(String),
    #[error("No remote model configured")]
    NotConfigured,
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Remote model request timed out")]
    Timeout,
}

/// Trait for AI providers.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a response from the AI provider.
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError>;
}

/// POST a JSON body and return the parsed JSON response, retrying 5xx responses.
async fn post_json(
    client: &Client,
    url: &str,
    headers: &[(&'static str, String)],
    body: &serde_json::Value,
    max_retries: u32,
) -> Result<serde_json::Value, AiError> {
    let mut attempt = 0;
    loop {
        let mut request = client.post(url).header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                AiError::Timeout
            } else {
                AiError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AiError::ParseError(e.to_string()));
        }

        if should_retry(status.as_u16(), attempt, max_retries) {
            tokio::time::sleep(calculate_backoff(attempt)).await;
            attempt += 1;
            continue;
        }

        let text = response.text().await.unwrap_or_default();
        return Err(AiError::RequestFailed(format!("HTTP {status}: {text}")));
    }
}

/// Connection settings shared by every provider.
#[derive(Debug, Clone)]
struct Endpoint {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
}

impl Endpoint {
    fn new(config: &AiConfig, api_key: String) -> Self {
        Self {
            client: build_http_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        }
    }
}

/// Gemini API provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    endpoint: Endpoint,
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        let ep = &self.endpoint;
        let url = format!("{}/models/{}:generateContent", ep.base_url, ep.model);

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": user }]
            }],
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "generationConfig": {
                "maxOutputTokens": ep.max_tokens
            }
        });

        let headers = [("x-goog-api-key", ep.api_key.clone())];
        let json = post_json(&ep.client, &url, &headers, &body, ep.max_retries).await?;

        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AiError::ParseError("No text in Gemini response".to_string()))
    }
}

/// Claude API provider.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    endpoint: Endpoint,
}

#[async_trait]
impl AiProvider for ClaudeProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        let ep = &self.endpoint;
        let url = format!("{}/v1/messages", ep.base_url);

        let body = serde_json::json!({
            "model": ep.model,
            "max_tokens": ep.max_tokens,
            "system": system,
            "messages": [{
                "role": "user",
                "content": user
            }]
        });

        let headers = [
            ("x-api-key", ep.api_key.clone()),
            ("anthropic-version", "2023-06-01".to_string()),
        ];
        let json = post_json(&ep.client, &url, &headers, &body, ep.max_retries).await?;

        json["content"][0]["text"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AiError::ParseError("No text in Claude response".to_string()))
    }
}

/// OpenAI chat completions provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    endpoint: Endpoint,
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        let ep = &self.endpoint;
        let url = format!("{}/chat/completions", ep.base_url);

        let body = serde_json::json!({
            "model": ep.model,
            "max_tokens": ep.max_tokens,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        });

        let headers = [("Authorization", format!("Bearer {}", ep.api_key))];
        let json = post_json(&ep.client, &url, &headers, &body, ep.max_retries).await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| AiError::ParseError("No text in OpenAI response".to_string()))
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(GeminiProvider),
    Claude(ClaudeProvider),
    OpenAi(OpenAiProvider),
}

impl Provider {
    /// Build the provider named by `config`, authenticating with `api_key`.
    #[must_use]
    pub fn from_config(config: &AiConfig, api_key: String) -> Self {
        let endpoint = Endpoint::new(config, api_key);
        match config.provider {
            ProviderKind::Gemini => Self::Gemini(GeminiProvider { endpoint }),
            ProviderKind::Claude => Self::Claude(ClaudeProvider { endpoint }),
            ProviderKind::OpenAi => Self::OpenAi(OpenAiProvider { endpoint }),
        }
    }
}

#[async_trait]
impl AiProvider for Provider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        match self {
            Self::Gemini(p) => p.generate(system, user).await,
            Self::Claude(p) => p.generate(system, user).await,
            Self::OpenAi(p) => p.generate(system, user).await,
        }
    }
}

/// Client for the remote summarization and key-selection calls.
///
/// Every call is bounded by the configured timeout; expiry surfaces as
/// [`AiError::Timeout`].
#[derive(Clone)]
pub struct AiClient {
    provider: Arc<dyn AiProvider>,
    config: AiConfig,
}

impl fmt::Debug for AiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiClient")
            .field("provider", &self.config.provider)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// Create a new client with the given provider and config.
    #[must_use]
    pub fn new(provider: Arc<dyn AiProvider>, config: AiConfig) -> Self {
        Self { provider, config }
    }

    /// Create client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AiError::MissingApiKey` if the configured API key environment
    /// variable is not set.
    pub fn from_config(config: AiConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| AiError::MissingApiKey(config.api_key_env.clone()))?;

        let provider = Provider::from_config(&config, api_key);
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Get the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider kind.
    #[must_use]
    pub fn provider_kind(&self) -> &ProviderKind {
        &self.config.provider
    }

    /// Per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        match tokio::time::timeout(self.timeout(), self.provider.generate(system, user)).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout),
        }
    }

    /// Ask the model for a short thematic summary of one knowledge document.
    ///
    /// # Errors
    ///
    /// Returns the provider error, `AiError::Timeout`, or `AiError::ParseError`
    /// when the model answers with an empty summary.
    pub async fn summarize(&self, key: &str, excerpt: &str) -> Result<String, AiError> {
        let text = self
            .generate(SUMMARY_SYSTEM_PROMPT, &format_summary_request(key, excerpt))
            .await?;
        let summary = text.trim();
        if summary.is_empty() {
            return Err(AiError::ParseError(format!("Empty summary for {key}")));
        }
        Ok(summary.to_string())
    }

    /// Ask the model which knowledge keys are relevant; returns the raw answer.
    ///
    /// # Errors
    ///
    /// Returns the provider error or `AiError::Timeout`.
    pub async fn choose_keys(&self, prompt: &str) -> Result<String, AiError> {
        self.generate(SELECTION_SYSTEM_PROMPT, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowProvider;

    #[async_trait]
    impl AiProvider for SlowProvider {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, AiError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    struct EchoProvider(&'static str);

    #[async_trait]
    impl AiProvider for EchoProvider {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, AiError> {
            Ok(self.0.to_string())
        }
    }

    fn config_with_timeout(timeout_secs: u64) -> AiConfig {
        AiConfig {
            timeout_secs,
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_http_client_has_timeouts() {
        let client = build_http_client();
        assert!(format!("{client:?}").contains("Client"));
    }

    #[test]
    fn test_should_retry_logic() {
        assert!(should_retry(500, 0, 3));
        assert!(should_retry(503, 2, 3));
        assert!(!should_retry(500, 3, 3));
        assert!(!should_retry(400, 0, 3));
        assert!(!should_retry(429, 0, 3));
        assert!(!should_retry(200, 0, 3));

        // Default configuration never retries.
        assert!(!should_retry(500, 0, 0));
    }

    #[test]
    fn test_calculate_backoff() {
        assert_eq!(calculate_backoff(0).as_secs(), 1);
        assert_eq!(calculate_backoff(1).as_secs(), 2);
        assert_eq!(calculate_backoff(2).as_secs(), 4);
    }

    #[test]
    fn test_provider_from_config_openai() {
        let config = AiConfig {
            provider: ProviderKind::OpenAi,
            base_url: "https://api.openai.com/v1/".to_string(),
            ..AiConfig::default()
        };
        let provider = Provider::from_config(&config, "key".to_string());
        match provider {
            Provider::OpenAi(p) => assert_eq!(p.endpoint.base_url, "https://api.openai.com/v1"),
            other => panic!("Expected OpenAi provider, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_from_config_claude() {
        let config = AiConfig {
            provider: ProviderKind::Claude,
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 2048,
            ..AiConfig::default()
        };
        let provider = Provider::from_config(&config, "key".to_string());
        match provider {
            Provider::Claude(p) => {
                assert_eq!(p.endpoint.model, "claude-3-haiku-20240307");
                assert_eq!(p.endpoint.max_tokens, 2048);
            }
            other => panic!("Expected Claude provider, got {other:?}"),
        }
    }

    #[test]
    fn test_from_config_missing_key() {
        let config = AiConfig {
            api_key_env: "PERSONAL_KNOWLEDGE_TEST_MISSING_KEY".to_string(),
            ..AiConfig::default()
        };
        let result = AiClient::from_config(config);
        assert!(matches!(result, Err(AiError::MissingApiKey(_))));
    }

    #[test]
    fn test_from_config_gemini() {
        std::env::set_var("PERSONAL_KNOWLEDGE_TEST_GEMINI_KEY", "test-key");
        let config = AiConfig {
            provider: ProviderKind::Gemini,
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "PERSONAL_KNOWLEDGE_TEST_GEMINI_KEY".to_string(),
            ..AiConfig::default()
        };
        let client = AiClient::from_config(config).unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash");
        assert_eq!(client.provider_kind(), &ProviderKind::Gemini);
        std::env::remove_var("PERSONAL_KNOWLEDGE_TEST_GEMINI_KEY");
    }

    #[tokio::test]
    async fn test_call_timeout_maps_to_timeout_error() {
        let client = AiClient::new(Arc::new(SlowProvider), config_with_timeout(1));
        let result = client.choose_keys("anything").await;
        assert!(matches!(result, Err(AiError::Timeout)));
    }

    #[tokio::test]
    async fn test_summarize_trims_output() {
        let client = AiClient::new(
            Arc::new(EchoProvider("  A short summary.  \n")),
            AiConfig::default(),
        );
        let summary = client.summarize("personal", "content").await.unwrap();
        assert_eq!(summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_summarize_rejects_empty_output() {
        let client = AiClient::new(Arc::new(EchoProvider("   ")), AiConfig::default());
        let result = client.summarize("personal", "content").await;
        assert!(matches!(result, Err(AiError::ParseError(_))));
    }
}
