use ap_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when at least one error was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let report = render_validation(config, config_path);
    print!("{}", report.text);
    report.ok
}

struct Report {
    text: String,
    ok: bool,
}

fn render_validation(config: &Config, config_path: &str) -> Report {
    let issues = config.validate();
    if issues.is_empty() {
        return Report {
            text: format!("Config OK ({config_path})\n"),
            ok: true,
        };
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    let mut text: String = issues.iter().map(|issue| format!("{issue}\n")).collect();
    text.push_str(&format!(
        "\n{error_count} error(s), {warning_count} warning(s) in {config_path}\n"
    ));
    Report {
        text,
        ok: error_count == 0,
    }
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_domain::config::{AuthConfig, ProviderConfig, ProviderKind};

    fn with_provider() -> Config {
        let mut config = Config::default();
        config.llm.provider = Some(ProviderConfig {
            id: "openai".into(),
            kind: ProviderKind::OpenaiResponses,
            base_url: "https://api.openai.com/v1".into(),
            auth: AuthConfig {
                env: Some("OPENAI_API_KEY".into()),
                ..Default::default()
            },
        });
        config
    }

    #[test]
    fn clean_config_reports_ok() {
        let report = render_validation(&with_provider(), "agentplan.toml");
        assert!(report.ok);
        assert_eq!(report.text, "Config OK (agentplan.toml)\n");
    }

    #[test]
    fn warnings_alone_still_pass() {
        let report = render_validation(&Config::default(), "agentplan.toml");
        assert!(report.ok);
        assert!(report.text.contains("[WARN] llm.provider"));
        assert!(report.text.contains("0 error(s), 1 warning(s)"));
    }

    #[test]
    fn errors_fail_validation() {
        let mut config = with_provider();
        config.planner.max_attempts = 0;
        let report = render_validation(&config, "x.toml");
        assert!(!report.ok);
        assert!(report.text.contains("[ERROR] planner.max_attempts"));
    }

    #[test]
    fn resolved_config_serializes() {
        let rendered = toml::to_string_pretty(&with_provider()).unwrap();
        let back: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(back.planner, with_provider().planner);
    }
}
