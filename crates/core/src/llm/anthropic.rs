use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{CompletionRequest, LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
// A stalled completion falls back to the deterministic recommendation, so keep this short.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(&self, req: CreateMessageRequest) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .map_err(|e| LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: if e.is_timeout() { "timeout" } else { "request" },
                status: None,
                detail: e.to_string(),
                raw_output: None,
                raw_response_json: None,
            })?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(http_error(status.as_u16(), text).into());
        }

        let parsed = serde_json::from_str::<CreateMessageResponse>(&text)
            .with_context(|| format!("failed to decode Anthropic response: {text}"))?;
        Ok(parsed)
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Unknown => {}
            }
        }
        out
    }
}

fn http_error(status: u16, body: String) -> LlmDiagnosticsError {
    let raw_response_json = serde_json::from_str::<serde_json::Value>(&body).ok();
    LlmDiagnosticsError {
        provider: Provider::Anthropic,
        stage: "http",
        status: Some(status),
        detail: format!("status={status}"),
        raw_output: Some(body),
        raw_response_json,
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        let res = self
            .create_message(CreateMessageRequest {
                model: self.model.clone(),
                max_tokens: self.max_tokens,
                system: Some(req.system),
                messages: vec![Message {
                    role: "user",
                    content: req.user,
                }],
            })
            .await?;

        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                max_tokens = self.max_tokens,
                "Anthropic stop_reason=max_tokens; completion may be truncated"
            );
        }

        let text = Self::response_text(&res);
        anyhow::ensure!(!text.trim().is_empty(), "Anthropic returned no text content");
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    // thinking, redacted_thinking, tool_use, ...
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_text_blocks_and_skips_others() {
        let res: CreateMessageResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "s"},
                {"type": "text", "text": "{\"a\":"},
                {"type": "tool_use", "id": "toolu_1", "name": "x", "input": {}},
                {"type": "text", "text": "1}"}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();

        assert_eq!(AnthropicClient::response_text(&res), "{\"a\":\n1}");
    }

    #[test]
    fn classifies_rate_limit_status() {
        let err = http_error(
            429,
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#
                .to_string(),
        );
        assert!(err.is_rate_limited());
        assert!(err.raw_response_json.is_some());

        let err = http_error(500, "upstream exploded".to_string());
        assert!(!err.is_rate_limited());
        assert!(err.raw_response_json.is_none());
    }

    #[test]
    fn serializes_request_without_empty_system() {
        let req = CreateMessageRequest {
            model: "m".to_string(),
            max_tokens: 10,
            system: None,
            messages: vec![Message {
                role: "user",
                content: "hi".to_string(),
            }],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("system").is_none());
        assert_eq!(v["messages"][0]["role"], "user");
    }
}
