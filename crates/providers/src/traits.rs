use ap_domain::error::Result;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single text-in/text-out completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Fully rendered prompt.
    pub input: String,
    /// Cooperative cancellation. Providers abandon the call when it fires
    /// and return [`Error::Cancelled`](ap_domain::error::Error::Cancelled).
    pub cancel: Option<CancellationToken>,
}

/// One entry of a Responses-API style `output` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputItem {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<OutputContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One entry of a chat-completions style `choices` array, reduced to the
/// message content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A completion response in any of the three shapes providers return.
///
/// Only fields with the expected JSON type are captured; anything else is
/// ignored so that a partially malformed payload still yields whatever
/// text it does carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<OutputItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChatChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    /// The provider payload exactly as received. `Null` for responses
    /// built in-process.
    #[serde(skip)]
    pub raw: Value,
}

impl CompletionResponse {
    /// Response carrying only `output_text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            output_text: Some(text.into()),
            ..Default::default()
        }
    }

    /// The payload to record for this response: the provider body when
    /// one was received, otherwise the typed view.
    pub fn raw_body(&self) -> Value {
        if self.raw.is_null() {
            serde_json::to_value(self).unwrap_or(Value::Null)
        } else {
            self.raw.clone()
        }
    }

    /// Leniently read a raw provider payload.
    pub fn from_value(body: &Value) -> Self {
        let output_text = body
            .get("output_text")
            .and_then(|v| v.as_str())
            .map(String::from);

        let output = body
            .get("output")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().map(parse_output_item).collect())
            .unwrap_or_default();

        let choices = body
            .get("choices")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .map(|choice| ChatChoice {
                        content: choice
                            .get("message")
                            .and_then(|m| m.get("content"))
                            .and_then(|c| c.as_str())
                            .map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = body.get("usage").filter(|u| u.is_object()).cloned();

        Self {
            output_text,
            output,
            choices,
            usage,
            raw: body.clone(),
        }
    }
}

fn parse_output_item(item: &Value) -> OutputItem {
    let content = item
        .get("content")
        .and_then(|c| c.as_array())
        .map(|parts| {
            parts
                .iter()
                .map(|part| OutputContent {
                    text: part.get("text").and_then(|t| t.as_str()).map(String::from),
                })
                .collect()
        })
        .unwrap_or_default();
    OutputItem {
        content,
        text: item.get("text").and_then(|t| t.as_str()).map(String::from),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The external text-completion capability consumed by the planner.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one completion request and wait for the full response.
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_responses_api_shape() {
        let body = json!({
            "model": "gpt-5-mini",
            "output": [
                { "type": "message", "content": [{ "type": "output_text", "text": "{\"steps\":[]}" }] },
                { "type": "reasoning", "text": "thinking" }
            ],
            "usage": { "input_tokens": 10, "output_tokens": 4 }
        });
        let resp = CompletionResponse::from_value(&body);
        assert!(resp.output_text.is_none());
        assert_eq!(resp.output.len(), 2);
        assert_eq!(resp.output[0].content[0].text.as_deref(), Some("{\"steps\":[]}"));
        assert_eq!(resp.output[1].text.as_deref(), Some("thinking"));
        assert_eq!(resp.usage, Some(json!({ "input_tokens": 10, "output_tokens": 4 })));
        assert_eq!(resp.raw, body);
        assert_eq!(resp.raw_body()["output"][1]["type"], "reasoning");
    }

    #[test]
    fn reads_chat_completion_shape() {
        let body = json!({ "choices": [{ "message": { "role": "assistant", "content": "hi" } }] });
        let resp = CompletionResponse::from_value(&body);
        assert_eq!(resp.choices[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn ignores_mistyped_fields() {
        let body = json!({ "output_text": 42, "output": "nope", "choices": {}, "usage": "n/a" });
        let resp = CompletionResponse::from_value(&body);
        assert!(resp.output_text.is_none());
        assert!(resp.output.is_empty());
        assert!(resp.choices.is_empty());
        assert!(resp.usage.is_none());
    }

    #[test]
    fn in_process_response_records_typed_view() {
        let resp = CompletionResponse::from_text("{}");
        assert!(resp.raw.is_null());
        assert_eq!(resp.raw_body(), json!({ "output_text": "{}" }));
    }
}
