//! The plan wire contract: what callers send in and what they get back.
//!
//! Field names serialize in camelCase so persisted plans and approval-queue
//! payloads match the JSON shape consumed downstream.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::role::Role;
use crate::tool::ToolKey;
use crate::trace::PlannerEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Planning persona. Selects prompt framing and the persona version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    Close,
    Tax,
    Audit,
    Advisory,
    Client,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Close => "CLOSE",
            AgentType::Tax => "TAX",
            AgentType::Audit => "AUDIT",
            AgentType::Advisory => "ADVISORY",
            AgentType::Client => "CLIENT",
        }
    }

    pub fn persona_version(self) -> &'static str {
        match self {
            AgentType::Close => "close-controller.v1",
            AgentType::Tax => "tax-lead.v1",
            AgentType::Audit => "audit-partner.v1",
            AgentType::Advisory => "advisory-lead.v1",
            AgentType::Client => "client-collab.v1",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLOSE" => Ok(AgentType::Close),
            "TAX" => Ok(AgentType::Tax),
            "AUDIT" => Ok(AgentType::Audit),
            "ADVISORY" => Ok(AgentType::Advisory),
            "CLIENT" => Ok(AgentType::Client),
            other => Err(format!("unknown agent type '{other}'")),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request context
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A tool the caller explicitly asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedTool {
    pub tool_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_role: Option<Role>,
}

/// Typed view of the caller-provided context for a plan request.
///
/// Fields this crate does not interpret are kept in `extra`. The plan
/// echoes the caller's original JSON, not this view, so role spelling and
/// empty collections survive unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    #[serde(default)]
    pub requested_tools: Vec<RequestedTool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_role_required: Option<Role>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Plan document
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A declared intent for a step to invoke an allowlisted tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolIntent {
    pub tool_key: ToolKey,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub step_index: u32,
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_intents: Option<Vec<ToolIntent>>,
}

impl PlanStep {
    pub fn tool_keys(&self) -> impl Iterator<Item = ToolKey> + '_ {
        self.tool_intents.iter().flatten().map(|intent| intent.tool_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub plan_version: String,
    pub agent_type: AgentType,
    /// ISO-8601 timestamp. Model-supplied values are kept as given.
    pub created_at: String,
    pub created_by_role: Role,
    pub requires_citations: bool,
    pub steps: Vec<PlanStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// The request context exactly as the caller supplied it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_context: Option<Value>,
}

/// An explicit decision not to produce a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRefusal {
    pub reason: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationOutcome {
    Success { plan: PlanDocument },
    Refused { refusal: PlanRefusal },
    /// The caller's cancellation signal fired during generation.
    Cancelled,
}

/// Top-level return value of a plan generation.
///
/// Callers inspect `status` and `is_fallback` to detect degraded operation;
/// generation itself never returns an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(flatten)]
    pub outcome: GenerationOutcome,
    pub persona_version: String,
    pub policy_pack_version: String,
    pub model: String,
    pub attempts: u32,
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<PlannerEvent>,
}

impl GenerationResult {
    pub fn plan(&self) -> Option<&PlanDocument> {
        match &self.outcome {
            GenerationOutcome::Success { plan } => Some(plan),
            _ => None,
        }
    }

    pub fn refusal(&self) -> Option<&PlanRefusal> {
        match &self.outcome {
            GenerationOutcome::Refused { refusal } => Some(refusal),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, GenerationOutcome::Success { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, GenerationOutcome::Cancelled)
    }

    pub fn status(&self) -> &'static str {
        match self.outcome {
            GenerationOutcome::Success { .. } => "success",
            GenerationOutcome::Refused { .. } => "refused",
            GenerationOutcome::Cancelled => "cancelled",
        }
    }
}
