pub mod config;
pub mod plan;

use clap::{Parser, Subcommand};

use ap_domain::config::Config;

/// Environment variable naming the config file.
pub const ENV_CONFIG_PATH: &str = "AGENTPLAN_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "agentplan.toml";

/// agentplan: generate and validate agent execution plans.
#[derive(Debug, Parser)]
#[command(name = "agentplan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a plan for one request and print the result.
    Plan(plan::PlanArgs),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `AGENTPLAN_CONFIG` (or
/// `agentplan.toml` by default) and apply environment overrides.
/// Returns the resolved [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path =
        std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = load_config_from(&config_path)?;
    config.planner.apply_env_overrides();
    Ok((config, config_path))
}

/// Parse `path` as TOML. A missing file yields the defaults.
pub fn load_config_from(path: &str) -> anyhow::Result<Config> {
    if !std::path::Path::new(path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}
