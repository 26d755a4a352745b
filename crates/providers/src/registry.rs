use std::sync::Arc;
use std::time::Duration;

use ap_domain::config::LlmConfig;
use ap_domain::error::Result;

use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::CompletionProvider;

/// Build the configured completion provider.
///
/// `Ok(None)` means no capability is configured at all, which the planner
/// treats differently from a provider that fails at call time.
pub fn build_provider(cfg: &LlmConfig) -> Result<Option<Arc<dyn CompletionProvider>>> {
    let Some(provider_cfg) = cfg.provider.as_ref() else {
        tracing::info!("no completion provider configured");
        return Ok(None);
    };

    let provider =
        OpenAiCompatProvider::from_config(provider_cfg, Duration::from_millis(cfg.timeout_ms))?;
    tracing::info!(
        provider = %provider_cfg.id,
        kind = ?provider_cfg.kind,
        "completion provider initialized"
    );
    Ok(Some(Arc::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_domain::config::{AuthConfig, ProviderConfig, ProviderKind};

    #[test]
    fn absent_provider_is_none() {
        let built = build_provider(&LlmConfig::default()).unwrap();
        assert!(built.is_none());
    }

    #[test]
    fn configured_provider_is_built() {
        let cfg = LlmConfig {
            provider: Some(ProviderConfig {
                id: "local".into(),
                kind: ProviderKind::OpenaiChat,
                base_url: "http://localhost:11434/v1".into(),
                auth: AuthConfig::default(),
            }),
            ..Default::default()
        };
        let built = build_provider(&cfg).unwrap().unwrap();
        assert_eq!(built.provider_id(), "local");
    }

    #[test]
    fn missing_key_env_is_an_error() {
        let cfg = LlmConfig {
            provider: Some(ProviderConfig {
                id: "openai".into(),
                kind: ProviderKind::OpenaiResponses,
                base_url: "https://api.openai.com/v1".into(),
                auth: AuthConfig {
                    env: Some("AP_TEST_REGISTRY_MISSING_KEY_4242".into()),
                    ..Default::default()
                },
            }),
            ..Default::default()
        };
        assert!(build_provider(&cfg).is_err());
    }
}
