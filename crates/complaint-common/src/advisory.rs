//! Optional advisory text from an OpenAI-compatible chat endpoint.
//!
//! The rule table already produces advice; this client asks a model for a
//! short, complaint-specific paragraph on top of it. It is only constructed
//! when both a base URL and a model are configured.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use complaint_engine::ComplaintAnalysis;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{env_var, parse_var};
use crate::error::CommonError;

const SYSTEM_PROMPT: &str = "You help citizens route complaints to the right public institution. \
Given a complaint and its classification, reply with one short paragraph of practical next steps. \
Do not invent phone numbers, email addresses or case numbers.";

#[derive(Clone, Debug)]
pub struct AdvisoryConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl AdvisoryConfig {
    /// Read advisory settings from the environment.
    ///
    /// Returns `Ok(None)` unless both `ADVISORY_BASE_URL` and `ADVISORY_MODEL`
    /// are set. Optional: `ADVISORY_TIMEOUT_SECS` (default 15),
    /// `ADVISORY_MAX_RETRIES` (default 2).
    pub fn from_env() -> Result<Option<Self>, CommonError> {
        Self::from_vars(env_var)
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, CommonError> {
        let base_url = var("ADVISORY_BASE_URL").filter(|s| !s.trim().is_empty());
        let model = var("ADVISORY_MODEL").filter(|s| !s.trim().is_empty());
        let (Some(base_url), Some(model)) = (base_url, model) else {
            return Ok(None);
        };

        let timeout_secs: u64 = parse_var(&var, "ADVISORY_TIMEOUT_SECS", 15)?;
        let max_retries: u32 = parse_var(&var, "ADVISORY_MAX_RETRIES", 2)?;

        Ok(Some(
            Self::new(base_url.trim(), model.trim())
                .with_timeout(Duration::from_secs(timeout_secs))
                .with_max_retries(max_retries),
        ))
    }

    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: Duration::from_secs(15),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(5_000),
            max_error_body_bytes: 8 * 1024,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("upstream reply had no content")]
    EmptyReply,
}

#[derive(Clone)]
pub struct AdvisoryClient {
    config: AdvisoryConfig,
    http: reqwest::Client,
}

impl AdvisoryClient {
    pub fn new(config: AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let http = reqwest::Client::builder()
            .user_agent("complaint-router/advisory")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// Ask the model for advice on one complaint.
    pub async fn advise(
        &self,
        text: &str,
        analysis: &ComplaintAnalysis,
    ) -> Result<String, AdvisoryError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt(text, analysis),
                },
            ],
            temperature: Some(0.2),
            max_tokens: Some(300),
        };

        let response: ChatCompletionResponse = self
            .request_with_retry(|| async {
                let resp = self
                    .http
                    .post(&url)
                    .timeout(self.config.timeout)
                    .json(&request)
                    .send()
                    .await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            })
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(AdvisoryError::EmptyReply)
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, AdvisoryError> {
        if resp.status().is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(&body) {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| "unknown upstream error".to_string());
            return Err(AdvisoryError::Upstream { status, message });
        }
        Err(AdvisoryError::UpstreamBody { status, body })
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, AdvisoryError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, AdvisoryError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "advisory request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn user_prompt(text: &str, analysis: &ComplaintAnalysis) -> String {
    format!(
        "Classification: {}\nTags: {}\nRecommended route: {}\n\nComplaint:\n{}",
        analysis.classification,
        analysis.tags.join(", "),
        analysis.recommendation,
        text.trim()
    )
}

fn should_retry(err: &AdvisoryError) -> bool {
    match err {
        AdvisoryError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        AdvisoryError::Upstream { status, .. } | AdvisoryError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        AdvisoryError::EmptyReply => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            b.truncate(max_bytes);
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        let initial = Duration::from_millis(200);
        let max = Duration::from_millis(1_000);
        let first = backoff_delay(initial, max, 0);
        assert!(first >= initial && first <= Duration::from_millis(250));
        let late = backoff_delay(initial, max, 40);
        assert!(late >= max && late <= Duration::from_millis(1_250));
    }

    #[test]
    fn test_should_retry_on_server_errors_only() {
        let busy = AdvisoryError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".to_string(),
        };
        let down = AdvisoryError::UpstreamBody {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        let bad = AdvisoryError::Upstream {
            status: StatusCode::BAD_REQUEST,
            message: "bad model".to_string(),
        };
        assert!(should_retry(&busy));
        assert!(should_retry(&down));
        assert!(!should_retry(&bad));
        assert!(!should_retry(&AdvisoryError::EmptyReply));
    }

    #[test]
    fn test_user_prompt_carries_classification() {
        let analysis = complaint_engine::evaluate("The police arrested me");
        let prompt = user_prompt("  The police arrested me  ", &analysis);
        assert!(prompt.starts_with("Classification: Police misconduct"));
        assert!(prompt.contains("Tags: police, human_rights"));
        assert!(prompt.ends_with("Complaint:\nThe police arrested me"));
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = AdvisoryConfig::new("http://localhost:8001/v1/", "local-model")
            .with_max_retries(0);
        assert_eq!(config.base_url, "http://localhost:8001/v1");
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_from_vars_requires_url_and_model() {
        let only_url = |name: &str| (name == "ADVISORY_BASE_URL").then(|| "http://ai:8001/v1".to_string());
        assert!(AdvisoryConfig::from_vars(only_url).unwrap().is_none());

        let both = |name: &str| match name {
            "ADVISORY_BASE_URL" => Some("http://ai:8001/v1/".to_string()),
            "ADVISORY_MODEL" => Some("local-model".to_string()),
            "ADVISORY_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        };
        let config = AdvisoryConfig::from_vars(both).unwrap().unwrap();
        assert_eq!(config.base_url, "http://ai:8001/v1");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_from_vars_rejects_bad_number() {
        let vars = |name: &str| match name {
            "ADVISORY_BASE_URL" => Some("http://ai:8001/v1".to_string()),
            "ADVISORY_MODEL" => Some("local-model".to_string()),
            "ADVISORY_MAX_RETRIES" => Some("lots".to_string()),
            _ => None,
        };
        assert!(matches!(
            AdvisoryConfig::from_vars(vars),
            Err(CommonError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_without_retry_storm() {
        let config = AdvisoryConfig::new("http://127.0.0.1:9", "m")
            .with_timeout(Duration::from_millis(200))
            .with_max_retries(0);
        let client = AdvisoryClient::new(config).unwrap();
        let analysis = ComplaintAnalysis::general();
        assert!(client.advise("hello", &analysis).await.is_err());
    }
}
