//! OpenAI-compatible completion adapter.
//!
//! Speaks either the Responses API (`/responses`) or chat completions
//! (`/chat/completions`), so it works against OpenAI, Azure-fronted
//! gateways, Ollama, vLLM and similar endpoints.

use std::time::Duration;

use crate::traits::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::util::{from_reqwest, resolve_api_key, with_cancellation};
use ap_domain::config::{ProviderConfig, ProviderKind};
use ap_domain::error::{Error, Result};
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    id: String,
    kind: ProviderKind,
    base_url: String,
    api_key: Option<String>,
    auth_header: String,
    auth_prefix: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider from the deserialized provider config.
    pub fn from_config(cfg: &ProviderConfig, timeout: Duration) -> Result<Self> {
        if cfg.base_url.trim().is_empty() {
            return Err(Error::Config(format!(
                "provider '{}' has an empty base_url",
                cfg.id
            )));
        }
        let api_key = resolve_api_key(&cfg.auth)?;
        let auth_header = cfg
            .auth
            .header
            .clone()
            .unwrap_or_else(|| "Authorization".into());
        let auth_prefix = cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into());

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            kind: cfg.kind,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_header,
            auth_prefix,
            client,
        })
    }

    fn endpoint_url(&self) -> String {
        match self.kind {
            ProviderKind::OpenaiResponses => format!("{}/responses", self.base_url),
            ProviderKind::OpenaiChat => format!("{}/chat/completions", self.base_url),
        }
    }

    fn build_body(&self, req: &CompletionRequest) -> Value {
        build_body(self.kind, req)
    }

    async fn post(&self, url: String, body: Value) -> Result<CompletionResponse> {
        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            builder = builder.header(&self.auth_header, format!("{}{}", self.auth_prefix, key));
        }

        let resp = builder.json(&body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        Ok(CompletionResponse::from_value(&resp_json))
    }
}

fn build_body(kind: ProviderKind, req: &CompletionRequest) -> Value {
    match kind {
        ProviderKind::OpenaiResponses => serde_json::json!({
            "model": req.model,
            "input": req.input,
        }),
        ProviderKind::OpenaiChat => serde_json::json!({
            "model": req.model,
            "messages": [{ "role": "user", "content": req.input }],
        }),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        let url = self.endpoint_url();
        let body = self.build_body(&req);

        tracing::debug!(provider = %self.id, url = %url, model = %req.model, "completion request");

        with_cancellation(req.cancel.as_ref(), self.post(url, body)).await
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
