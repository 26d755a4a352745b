mod llm;
mod logging;
mod planner;

pub use llm::*;
pub use logging::*;
pub use planner::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.planner.max_attempts == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "planner.max_attempts".into(),
                message: "must be at least 1".into(),
            });
        }

        if self.planner.model.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "planner.model".into(),
                message: "model must not be empty".into(),
            });
        }

        match &self.llm.provider {
            None => errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm.provider".into(),
                message: "no provider configured; every plan will be the fallback plan".into(),
            }),
            Some(provider) => {
                if provider.id.is_empty() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: "llm.provider.id".into(),
                        message: "provider id must not be empty".into(),
                    });
                }
                if provider.base_url.is_empty() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: "llm.provider.base_url".into(),
                        message: "provider base_url must not be empty".into(),
                    });
                }
                if provider.auth.key.is_some() {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Warning,
                        field: "llm.provider.auth.key".into(),
                        message: "plaintext API key in config; prefer 'env'".into(),
                    });
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_only_warns_about_missing_provider() {
        let issues = Config::default().validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert_eq!(issues[0].field, "llm.provider");
    }

    #[test]
    fn zero_attempts_is_an_error() {
        let mut cfg = Config::default();
        cfg.planner.max_attempts = 0;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|e| e.field == "planner.max_attempts" && e.severity == ConfigSeverity::Error));
    }

    #[test]
    fn provider_with_empty_fields_is_reported() {
        let mut cfg = Config::default();
        cfg.llm.provider = Some(ProviderConfig {
            id: String::new(),
            kind: ProviderKind::OpenaiResponses,
            base_url: String::new(),
            auth: AuthConfig {
                key: Some("sk-test".into()),
                ..Default::default()
            },
        });
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"llm.provider.id".to_string()));
        assert!(fields.contains(&"llm.provider.base_url".to_string()));
        assert!(fields.contains(&"llm.provider.auth.key".to_string()));
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError {
            severity: ConfigSeverity::Warning,
            field: "llm.provider".into(),
            message: "missing".into(),
        };
        assert_eq!(e.to_string(), "[WARN] llm.provider: missing");
    }
}
