//! Planner prompt construction.

use serde::Serialize;

use ap_domain::tool::ToolKey;

use crate::request::PlanRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    fn label(self) -> &'static str {
        match self {
            MessageRole::System => "SYSTEM",
            MessageRole::User => "USER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

fn system_prompt() -> String {
    let keys: Vec<&str> = ToolKey::ALL.iter().map(|k| k.as_str()).collect();
    format!(
        "You are an engagement planner for regulated finance/audit/tax workflows. \
         Produce a concise JSON plan describing 3-6 ordered steps that an autonomous agent should execute. \
         Each step should have: stepIndex (number), title, summary, optional exitCriteria, optional dependsOn \
         (array of stepIndex numbers), and optional toolIntents array. Every toolIntent must specify toolKey, \
         purpose, and optional inputs object. Use only valid tool keys referenced by the user or the canonical \
         set: {}. Never include executable code or free-form prose outside the JSON object. If the request is \
         unsafe or requires a manager role the user lacks, return \
         {{\"status\":\"refused\",\"reason\":\"...\",\"message\":\"...\"}}.",
        keys.join(", ")
    )
}

/// System + user message pair describing the request.
pub fn build_planner_messages(req: &PlanRequest) -> Vec<PromptMessage> {
    let ctx = req.request_context.as_ref();
    let description = req
        .description()
        .unwrap_or("No additional description provided.");

    let flag_summary = match ctx.map(|c| &c.flags).filter(|f| !f.is_empty()) {
        Some(flags) => flags
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", "),
        None => "none".into(),
    };

    let tool_summary = match ctx.map(|c| &c.requested_tools).filter(|t| !t.is_empty()) {
        Some(tools) => tools
            .iter()
            .map(|tool| match tool.min_role {
                Some(role) => format!("{} (min role: {role})", tool.tool_key),
                None => tool.tool_key.clone(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        None => "none".into(),
    };

    vec![
        PromptMessage {
            role: MessageRole::System,
            content: system_prompt(),
        },
        PromptMessage {
            role: MessageRole::User,
            content: format!(
                "Agent type: {}\nUser role: {}\nRequires citations: {}\nContext description: {}\nPolicy flags: {}\nRequested tools: {}",
                req.agent_type, req.user_role, req.enforce_citations, description, flag_summary, tool_summary
            ),
        },
    ]
}

/// Flatten messages into a single `ROLE: content` prompt.
pub fn render_prompt(messages: &[PromptMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
