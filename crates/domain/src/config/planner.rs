use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Planner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const ENV_POLICY_PACK_VERSION: &str = "AGENT_POLICY_PACK_VERSION";
pub const ENV_PLANNER_MODEL: &str = "AGENT_PLANNER_MODEL";
pub const ENV_AGENT_MODEL: &str = "AGENT_MODEL";

/// Process-wide planner settings. Read-only once resolved at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Model identifier sent with every completion request.
    #[serde(default = "d_model")]
    pub model: String,
    /// Version tag of the policy pack (allowlist + role minimums), recorded
    /// on every generation result.
    #[serde(default = "d_policy_pack")]
    pub policy_pack_version: String,
    /// Schema tag stamped on plans that do not carry their own.
    #[serde(default = "d_schema")]
    pub plan_schema_version: String,
    /// Completion attempts before degrading to the fallback plan.
    #[serde(default = "d_2")]
    pub max_attempts: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: d_model(),
            policy_pack_version: d_policy_pack(),
            plan_schema_version: d_schema(),
            max_attempts: 2,
        }
    }
}

impl PlannerConfig {
    /// Apply `AGENT_POLICY_PACK_VERSION` and `AGENT_PLANNER_MODEL`
    /// (falling back to `AGENT_MODEL`) from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(pack) = get(ENV_POLICY_PACK_VERSION) {
            self.policy_pack_version = pack;
        }
        if let Some(model) = get(ENV_PLANNER_MODEL).or_else(|| get(ENV_AGENT_MODEL)) {
            self.model = model;
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_model() -> String {
    "gpt-5-mini".into()
}
fn d_policy_pack() -> String {
    "policy-pack.v1".into()
}
fn d_schema() -> String {
    "2025-01-15.v1".into()
}
fn d_2() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = PlannerConfig::default();
        assert_eq!(cfg.model, "gpt-5-mini");
        assert_eq!(cfg.policy_pack_version, "policy-pack.v1");
        assert_eq!(cfg.plan_schema_version, "2025-01-15.v1");
        assert_eq!(cfg.max_attempts, 2);
    }

    #[test]
    fn planner_model_wins_over_agent_model() {
        let mut cfg = PlannerConfig::default();
        cfg.apply_overrides_from(lookup(&[
            (ENV_PLANNER_MODEL, "gpt-4.1"),
            (ENV_AGENT_MODEL, "gpt-4o"),
        ]));
        assert_eq!(cfg.model, "gpt-4.1");
    }

    #[test]
    fn agent_model_used_when_planner_model_unset() {
        let mut cfg = PlannerConfig::default();
        cfg.apply_overrides_from(lookup(&[
            (ENV_AGENT_MODEL, "gpt-4o"),
            (ENV_POLICY_PACK_VERSION, "policy-pack.v7"),
        ]));
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.policy_pack_version, "policy-pack.v7");
    }

    #[test]
    fn blank_values_are_ignored() {
        let mut cfg = PlannerConfig::default();
        cfg.apply_overrides_from(lookup(&[(ENV_PLANNER_MODEL, "  ")]));
        assert_eq!(cfg.model, "gpt-5-mini");
    }
}
