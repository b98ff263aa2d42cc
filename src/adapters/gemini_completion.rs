use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::{
    app::ports::{CompletionPort, CompletionRequest},
    domain::errors::{DomainError, ProviderErrorKind, Result},
};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_ERROR_BODY_CHARS: usize = 512;
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `generateContent` client. One HTTP request per completion, no retries.
pub struct GeminiCompletionAdapter {
    config: GeminiConfig,
    client: Client,
}

impl GeminiCompletionAdapter {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::InvalidData(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl CompletionPort for GeminiCompletionAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Value> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(DomainError::provider(
                ProviderErrorKind::Rejected,
                "no API key configured (set GEMINI_API_KEY or GOOGLE_API_KEY)",
            ));
        };

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_provider_schema(&request.output_schema),
            },
        };

        tracing::debug!(
            tool = %request.tool,
            model = %self.config.model,
            "sending generateContent request"
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(DomainError::provider(
                classify_status(status),
                format!("HTTP {}: {}", status.as_u16(), truncate(&text)),
            ));
        }

        let reply: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            DomainError::provider(
                ProviderErrorKind::MalformedReply,
                format!("unreadable response envelope: {}", e),
            )
        })?;
        let content = reply_text(&reply)?;
        parse_reply_json(&content)
    }
}

// ── wire format ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// Rewrite a JSON schema descriptor into the OpenAPI subset accepted as
/// `responseSchema`: upper-case type names, no `additionalProperties`.
pub fn to_provider_schema(schema: &Value) -> Value {
    let Some(map) = schema.as_object() else {
        return schema.clone();
    };
    let mut out = Map::new();
    for (key, value) in map {
        let converted = match key.as_str() {
            "additionalProperties" => continue,
            "type" => match value.as_str() {
                Some(name) => Value::String(name.to_uppercase()),
                None => value.clone(),
            },
            "properties" => match value.as_object() {
                Some(props) => Value::Object(
                    props
                        .iter()
                        .map(|(name, prop)| (name.clone(), to_provider_schema(prop)))
                        .collect(),
                ),
                None => value.clone(),
            },
            "items" => to_provider_schema(value),
            _ => value.clone(),
        };
        out.insert(key.clone(), converted);
    }
    Value::Object(out)
}

pub fn classify_status(status: StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        408 => ProviderErrorKind::Timeout,
        429 => ProviderErrorKind::RateLimited,
        500..=599 => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::Rejected,
    }
}

fn transport_error(err: reqwest::Error) -> DomainError {
    let kind = if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else if err.is_decode() {
        ProviderErrorKind::MalformedReply
    } else {
        ProviderErrorKind::Network
    };
    DomainError::provider(kind, err.to_string())
}

fn reply_text(reply: &GenerateResponse) -> Result<String> {
    if let Some(reason) = reply
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(DomainError::provider(
            ProviderErrorKind::Blocked,
            format!("prompt blocked: {}", reason),
        ));
    }

    let Some(candidate) = reply.candidates.first() else {
        return Err(DomainError::provider(
            ProviderErrorKind::Blocked,
            "response contained no candidates",
        ));
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();
    if !text.trim().is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason.as_deref() {
        Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => Err(DomainError::provider(
            ProviderErrorKind::Blocked,
            format!("generation stopped: {}", reason),
        )),
        _ => Err(DomainError::provider(
            ProviderErrorKind::MalformedReply,
            "candidate carried no text",
        )),
    }
}

fn parse_reply_json(text: &str) -> Result<Value> {
    serde_json::from_str(strip_json_fences(text)).map_err(|e| {
        DomainError::provider(
            ProviderErrorKind::MalformedReply,
            format!("reply is not valid JSON: {}", e),
        )
    })
}

fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(body: &str) -> String {
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ToolName;
    use serde_json::json;

    fn response(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_provider_schema_uppercases_types_and_drops_additional_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "type": { "type": "string", "description": "field named type" },
                "issues": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "priority": { "type": "string", "enum": ["High"] } },
                        "required": ["priority"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["type", "issues"],
            "additionalProperties": false
        });
        let converted = to_provider_schema(&schema);
        assert_eq!(converted["type"], "OBJECT");
        assert!(converted.get("additionalProperties").is_none());
        assert_eq!(converted["properties"]["type"]["type"], "STRING");
        assert_eq!(converted["properties"]["type"]["description"], "field named type");
        let items = &converted["properties"]["issues"]["items"];
        assert_eq!(items["type"], "OBJECT");
        assert!(items.get("additionalProperties").is_none());
        assert_eq!(items["properties"]["priority"]["enum"], json!(["High"]));
        assert_eq!(converted["required"], json!(["type", "issues"]));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(StatusCode::REQUEST_TIMEOUT), ProviderErrorKind::Timeout);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), ProviderErrorKind::RateLimited);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), ProviderErrorKind::Unavailable);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), ProviderErrorKind::Rejected);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), ProviderErrorKind::Rejected);
    }

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(strip_json_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("  ```\n{}\n```  "), "{}");
    }

    #[test]
    fn test_reply_text_concatenates_parts() {
        let reply = response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"commitMessage\":" }, { "text": "\"x\"}" }] },
                "finishReason": "STOP"
            }]
        }));
        let text = reply_text(&reply).unwrap();
        assert_eq!(parse_reply_json(&text).unwrap(), json!({ "commitMessage": "x" }));
    }

    #[test]
    fn test_blocked_replies() {
        let blocked = response(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        assert!(matches!(
            reply_text(&blocked),
            Err(DomainError::Provider { kind: ProviderErrorKind::Blocked, .. })
        ));

        let stopped = response(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
        assert!(matches!(
            reply_text(&stopped),
            Err(DomainError::Provider { kind: ProviderErrorKind::Blocked, .. })
        ));

        let empty = response(json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "STOP" }] }));
        assert!(matches!(
            reply_text(&empty),
            Err(DomainError::Provider { kind: ProviderErrorKind::MalformedReply, .. })
        ));
    }

    #[test]
    fn test_non_json_reply_is_malformed() {
        let err = parse_reply_json("Sure! Here is your commit message.").unwrap_err();
        assert!(matches!(
            err,
            DomainError::Provider { kind: ProviderErrorKind::MalformedReply, .. }
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let adapter = GeminiCompletionAdapter::new(GeminiConfig {
            base_url: "http://localhost:1234/".into(),
            model: "gemini-test".into(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            adapter.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected_without_network() {
        let adapter = GeminiCompletionAdapter::new(GeminiConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..GeminiConfig::default()
        })
        .unwrap();
        let err = adapter
            .complete(&CompletionRequest {
                tool: ToolName::CommitMessageGenerator,
                prompt: "p".into(),
                output_schema: json!({ "type": "object" }),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Provider { kind: ProviderErrorKind::Rejected, .. }
        ));
    }

    #[test]
    fn test_error_body_is_truncated() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let short = truncate(&long);
        assert_eq!(short.chars().count(), MAX_ERROR_BODY_CHARS + 1);
    }
}
