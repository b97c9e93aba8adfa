use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use scout_config::OracleConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::OracleTransport;

/// Cooldown applied when a throttled reply carries no `Retry-After`.
const THROTTLE_COOLDOWN: Duration = Duration::from_secs(600);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` transport.
///
/// Models are tried in configured order; a throttled model is benched for
/// its `Retry-After` period and the request moves on to the next one.
#[derive(Debug)]
pub struct ApiClient {
    endpoint: String,
    api_key: String,
    temperature: f32,
    http: reqwest::Client,
    rotator: Mutex<ModelRotator>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        models: Vec<String>,
        timeout: Duration,
        temperature: f32,
    ) -> Result<Self> {
        let rotator = ModelRotator::new(models)
            .ok_or_else(|| anyhow!("at least one oracle model must be configured"))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build oracle http client")?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            temperature,
            http,
            rotator: Mutex::new(rotator),
        })
    }

    pub fn from_config(config: &OracleConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::new(
            &config.base_url,
            api_key,
            config.model_list(),
            Duration::from_secs(config.timeout_secs),
            config.temperature,
        )
    }

    fn next_model(&self) -> Result<String> {
        let mut rotator = self
            .rotator
            .lock()
            .map_err(|_| anyhow!("model rotator poisoned"))?;
        rotator
            .acquire()
            .ok_or_else(|| anyhow!("every oracle model is cooling down after throttling"))
    }

    fn bench(&self, model: &str, cooldown: Duration) -> Result<()> {
        let mut rotator = self
            .rotator
            .lock()
            .map_err(|_| anyhow!("model rotator poisoned"))?;
        rotator.cool_down(model, cooldown);
        Ok(())
    }

    async fn send(&self, model: &str, system_prompt: &str, user_prompt: &str) -> Result<Attempt> {
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
        };

        debug!(%model, "sending oracle request");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("oracle request to {model} failed"))?;

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read oracle reply from {model}"))?;

        if status.is_success() {
            return reply_content(&body).map(Attempt::Reply);
        }
        if is_throttled(status, &body) {
            return Ok(Attempt::Throttled(retry_after.unwrap_or(THROTTLE_COOLDOWN)));
        }
        bail!("oracle model {model} answered {status}: {body}")
    }
}

enum Attempt {
    Reply(String),
    Throttled(Duration),
}

#[async_trait]
impl OracleTransport for ApiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        loop {
            let model = self.next_model()?;
            match self.send(&model, system_prompt, user_prompt).await? {
                Attempt::Reply(content) => return Ok(content),
                Attempt::Throttled(cooldown) => {
                    warn!(%model, cooldown_secs = cooldown.as_secs(), "oracle model throttled");
                    self.bench(&model, cooldown)?;
                }
            }
        }
    }
}

/// Priority-ordered model list with per-model cooldowns.
///
/// `acquire` always prefers the earliest configured model that is not
/// cooling down, so the primary model is used again as soon as it recovers.
#[derive(Debug, Clone)]
pub struct ModelRotator {
    models: Vec<String>,
    benched_until: HashMap<String, Instant>,
}

impl ModelRotator {
    /// `None` for an empty model list.
    pub fn new(models: Vec<String>) -> Option<Self> {
        if models.is_empty() {
            return None;
        }
        Some(Self {
            models,
            benched_until: HashMap::new(),
        })
    }

    /// Highest-priority model not cooling down, or `None` when all are.
    pub fn acquire(&mut self) -> Option<String> {
        let now = Instant::now();
        self.benched_until.retain(|_, until| *until > now);
        self.models
            .iter()
            .find(|model| !self.benched_until.contains_key(*model))
            .cloned()
    }

    pub fn cool_down(&mut self, model: &str, cooldown: Duration) {
        self.benched_until
            .insert(model.to_string(), Instant::now() + cooldown);
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

fn is_throttled(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    let body = body.to_ascii_lowercase();
    body.contains("rate_limit") || body.contains("quota")
}

/// `Retry-After` as delta-seconds or an HTTP date.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    Some(wait)
}

fn reply_content(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).context("oracle reply is not a chat completion")?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("oracle reply has no message content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn test_new_rejects_empty_model_list() {
        let err = ApiClient::new("http://localhost", "key", Vec::new(), Duration::from_secs(5), 0.7)
            .unwrap_err();
        assert!(err.to_string().contains("at least one oracle model"));
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let client = ApiClient::new(
            "http://localhost:11434/v1/",
            "key",
            models(&["llama3"]),
            Duration::from_secs(5),
            0.7,
        )
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_from_config_splits_models() {
        let config = OracleConfig {
            models: "model-a, model-b,".to_string(),
            ..OracleConfig::default()
        };
        let client = ApiClient::from_config(&config, "key").unwrap();
        let rotator = client.rotator.lock().unwrap();
        assert_eq!(rotator.models(), ["model-a", "model-b"]);
    }

    #[test]
    fn test_rotator_prefers_primary() {
        let mut rotator = ModelRotator::new(models(&["primary", "backup"])).unwrap();
        assert_eq!(rotator.acquire().as_deref(), Some("primary"));
        assert_eq!(rotator.acquire().as_deref(), Some("primary"));
    }

    #[test]
    fn test_rotator_fails_over_and_recovers() {
        let mut rotator = ModelRotator::new(models(&["primary", "backup"])).unwrap();
        rotator.cool_down("primary", Duration::from_secs(60));
        assert_eq!(rotator.acquire().as_deref(), Some("backup"));

        rotator.cool_down("primary", Duration::ZERO);
        assert_eq!(rotator.acquire().as_deref(), Some("primary"));
    }

    #[test]
    fn test_rotator_all_benched() {
        let mut rotator = ModelRotator::new(models(&["a", "b"])).unwrap();
        rotator.cool_down("a", Duration::from_secs(60));
        rotator.cool_down("b", Duration::from_secs(60));
        assert_eq!(rotator.acquire(), None);
    }

    #[test]
    fn test_rotator_requires_models() {
        assert!(ModelRotator::new(Vec::new()).is_none());
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_retry_after_past_date_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), Some(Duration::ZERO));
        assert_eq!(retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_throttle_detection() {
        assert!(is_throttled(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_throttled(
            StatusCode::FORBIDDEN,
            r#"{"error": {"code": "insufficient_quota"}}"#
        ));
        assert!(!is_throttled(StatusCode::BAD_REQUEST, "bad input"));
    }

    #[test]
    fn test_reply_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"decision\": \"skip\"}"}}]}"#;
        assert_eq!(reply_content(body).unwrap(), r#"{"decision": "skip"}"#);
    }

    #[test]
    fn test_reply_content_without_choices() {
        let err = reply_content(r#"{"error": "nope"}"#).unwrap_err();
        assert!(err.to_string().contains("no message content"));
        assert!(reply_content("<html>").is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
            temperature: 0.5,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let client = ApiClient::new(
            "http://127.0.0.1:9",
            "key",
            models(&["model-a"]),
            Duration::from_secs(2),
            0.7,
        )
        .unwrap();
        assert!(client.complete("system", "user").await.is_err());
    }
}
