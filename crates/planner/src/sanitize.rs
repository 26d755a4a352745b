//! Coerce a loosely-typed model payload into a canonical [`PlanDocument`].

use std::collections::HashSet;

use serde_json::{Map, Value};

use ap_domain::plan::{PlanDocument, PlanStep, RequestContext, ToolIntent};
use ap_domain::role::Role;
use ap_domain::trace::{EventLog, PlannerEvent};

use crate::policy::{admit_tool, ToolSource};
use crate::request::PlanRequest;

pub const REQUESTED_TOOL_PURPOSE: &str = "Explicitly requested by the user context.";
const DEFAULT_TOOL_PURPOSE: &str = "Run tool for this step.";

pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Normalise `payload` into a plan. The result may have zero steps, which
/// callers treat as an invalid attempt.
pub fn sanitise_plan_document(
    payload: &Value,
    req: &PlanRequest,
    schema_version: &str,
    events: &mut EventLog,
) -> PlanDocument {
    let str_field = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(String::from);

    let mut steps: Vec<PlanStep> = payload
        .get("steps")
        .and_then(|v| v.as_array())
        .map(|raw| {
            raw.iter()
                .enumerate()
                .filter_map(|(position, step)| normalise_step(step, position, events))
                .collect()
        })
        .unwrap_or_default();

    attach_requested_tools(&mut steps, req.request_context.as_ref(), events);

    PlanDocument {
        plan_version: str_field("planVersion").unwrap_or_else(|| schema_version.to_string()),
        agent_type: req.agent_type,
        created_at: str_field("createdAt").unwrap_or_else(now_iso),
        created_by_role: req.user_role,
        requires_citations: payload
            .get("requiresCitations")
            .and_then(|v| v.as_bool())
            .unwrap_or(req.enforce_citations),
        steps,
        notes: str_field("notes"),
        request_context: req.context_echo(),
    }
}

/// First key among `keys` holding a non-blank string, trimmed.
fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

/// Non-negative integer view of a JSON number (`2` and `2.0` both count).
fn as_index(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

pub fn normalise_step(raw: &Value, position: usize, events: &mut EventLog) -> Option<PlanStep> {
    let Some(record) = raw.as_object() else {
        events.record(PlannerEvent::StepDropped {
            position,
            reason: "not_an_object".into(),
        });
        return None;
    };

    let title = first_text(record, &["title", "name", "heading"]);
    let summary = first_text(record, &["summary", "description", "intent"]);
    let (Some(title), Some(summary)) = (title, summary) else {
        events.record(PlannerEvent::StepDropped {
            position,
            reason: "missing_title_or_summary".into(),
        });
        return None;
    };

    let step_index = record
        .get("stepIndex")
        .and_then(as_index)
        .unwrap_or(position as u32);

    let depends_on = record
        .get("dependsOn")
        .and_then(|v| v.as_array())
        .map(|deps| deps.iter().filter_map(as_index).collect());

    let tool_intents = record
        .get("toolIntents")
        .and_then(|v| v.as_array())
        .map(|intents| {
            intents
                .iter()
                .filter_map(|intent| normalise_tool_intent(intent, events))
                .collect()
        });

    Some(PlanStep {
        step_index,
        title,
        summary,
        exit_criteria: record
            .get("exitCriteria")
            .and_then(|v| v.as_str())
            .map(String::from),
        depends_on,
        tool_intents,
    })
}

pub fn normalise_tool_intent(raw: &Value, events: &mut EventLog) -> Option<ToolIntent> {
    let record = raw.as_object()?;
    let key = ["toolKey", "key"]
        .iter()
        .find_map(|k| record.get(*k).and_then(|v| v.as_str()))
        .filter(|k| !k.is_empty())?;
    let tool_key = admit_tool(key, ToolSource::Plan, events)?;

    let purpose = first_text(record, &["purpose", "reason", "summary"])
        .unwrap_or_else(|| DEFAULT_TOOL_PURPOSE.into());

    let min_role = ["minRole", "requiresRole", "min_role", "requires_role"]
        .iter()
        .find_map(|k| record.get(*k).filter(|v| !v.is_null()))
        .and_then(Role::from_value);

    Some(ToolIntent {
        tool_key,
        purpose,
        inputs: record.get("inputs").and_then(|v| v.as_object()).cloned(),
        notes: record.get("notes").and_then(|v| v.as_str()).map(String::from),
        min_role,
    })
}

/// Append the context's requested tools that no step already uses onto
/// the last step. Running it twice never duplicates an intent.
pub fn attach_requested_tools(
    steps: &mut [PlanStep],
    context: Option<&RequestContext>,
    events: &mut EventLog,
) {
    let Some(context) = context.filter(|c| !c.requested_tools.is_empty()) else {
        return;
    };
    let Some(last) = steps.len().checked_sub(1) else {
        return;
    };

    let mut known: HashSet<_> = steps.iter().flat_map(PlanStep::tool_keys).collect();
    let mut pending = Vec::new();
    for tool in &context.requested_tools {
        if tool.tool_key.is_empty() {
            continue;
        }
        let Some(key) = admit_tool(&tool.tool_key, ToolSource::Requested, events) else {
            continue;
        };
        if known.insert(key) {
            pending.push(ToolIntent {
                tool_key: key,
                purpose: REQUESTED_TOOL_PURPOSE.into(),
                inputs: Some(Map::new()),
                notes: None,
                min_role: tool.min_role,
            });
        }
    }

    if !pending.is_empty() {
        steps[last]
            .tool_intents
            .get_or_insert_with(Vec::new)
            .extend(pending);
    }
}
