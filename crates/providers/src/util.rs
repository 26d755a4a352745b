//! Shared utility functions for provider adapters.

use std::future::Future;

use ap_domain::config::AuthConfig;
use ap_domain::error::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, logs a warning)
/// 2. `env` field (reads environment variable)
/// 3. `None`: the endpoint is called without credentials
pub fn resolve_api_key(auth: &AuthConfig) -> Result<Option<String>> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; prefer 'env' instead"
        );
        return Ok(Some(key.clone()));
    }

    if let Some(ref env_var) = auth.env {
        return std::env::var(env_var).map(Some).map_err(|_| {
            Error::Auth(format!(
                "environment variable '{}' not set or not valid UTF-8",
                env_var
            ))
        });
    }

    Ok(None)
}

/// Drive `fut` to completion unless `cancel` fires first.
pub async fn with_cancellation<T, F>(cancel: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        Some(token) => {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                out = fut => out,
            }
        }
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn resolve_api_key_plaintext() {
        let auth = AuthConfig {
            key: Some("sk-test-123".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap().as_deref(), Some("sk-test-123"));
    }

    #[test]
    fn resolve_api_key_env_var() {
        let var_name = "AP_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig {
            env: Some(var_name.into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap().as_deref(), Some("env-secret-value"));
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let auth = AuthConfig {
            env: Some("AP_TEST_NONEXISTENT_VAR_8888".into()),
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("AP_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn resolve_api_key_unconfigured_is_none() {
        assert!(resolve_api_key(&AuthConfig::default()).unwrap().is_none());
    }

    #[tokio::test]
    async fn cancellation_wins_over_pending_future() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let out: Result<()> = with_cancellation(Some(&token), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;
        assert!(matches!(out, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let out = with_cancellation(Some(&token), async { Ok(1) }).await;
        assert!(matches!(out, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn no_token_runs_future() {
        let out = with_cancellation(None, async { Ok(7) }).await.unwrap();
        assert_eq!(out, 7);
    }
}
