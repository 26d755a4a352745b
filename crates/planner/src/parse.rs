//! Pull a JSON object out of free-form model output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use ap_domain::plan::PlanRefusal;
use ap_domain::role::Role;
use ap_providers::CompletionResponse;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```json\s*([\s\S]+?)```").expect("static regex"));

/// Text payload of a completion, trying `output_text`, then the `output`
/// array, then `choices[0].message.content`. Empty when none match.
pub fn extract_text(resp: &CompletionResponse) -> String {
    if let Some(text) = &resp.output_text {
        return text.clone();
    }

    let parts: Vec<&str> = resp
        .output
        .iter()
        .flat_map(|item| {
            item.content
                .iter()
                .filter_map(|part| part.text.as_deref())
                .chain(item.text.as_deref())
        })
        .collect();
    if !parts.is_empty() {
        return parts.join("\n");
    }

    resp.choices
        .first()
        .and_then(|c| c.content.clone())
        .unwrap_or_default()
}

/// Parse the JSON object embedded in `text`.
///
/// A fenced ```` ```json ```` block wins when present; otherwise the span
/// from the first `{` to the last `}` is parsed.
pub fn parse_planner_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = JSON_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&candidate[start..=end]).ok()
}

pub fn parse_planner_response(resp: &CompletionResponse) -> Option<Value> {
    parse_planner_text(&extract_text(resp))
}

/// Build a refusal when `payload.status` is `"refused"` (any case).
pub fn extract_refusal(payload: &Value) -> Option<PlanRefusal> {
    let obj = payload.as_object()?;
    let status = obj.get("status")?.as_str()?;
    if !status.eq_ignore_ascii_case("refused") {
        return None;
    }

    let str_field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(String::from);
    let required_role = ["requiredRole", "required_role", "minRoleRequired"]
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
        .and_then(Role::from_value);

    Some(PlanRefusal {
        reason: str_field("reason").unwrap_or_else(|| "refused".into()),
        message: str_field("message")
            .unwrap_or_else(|| "The planner declined to provide a plan.".into()),
        code: str_field("code"),
        required_role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_providers::traits::{ChatChoice, OutputContent, OutputItem};
    use serde_json::json;

    #[test]
    fn extract_prefers_output_text() {
        let resp = CompletionResponse {
            output_text: Some("direct".into()),
            choices: vec![ChatChoice {
                content: Some("chat".into()),
            }],
            ..Default::default()
        };
        assert_eq!(extract_text(&resp), "direct");
    }

    #[test]
    fn extract_joins_output_parts() {
        let resp = CompletionResponse {
            output: vec![
                OutputItem {
                    content: vec![
                        OutputContent {
                            text: Some("one".into()),
                        },
                        OutputContent { text: None },
                    ],
                    text: Some("two".into()),
                },
                OutputItem {
                    content: vec![],
                    text: Some("three".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(extract_text(&resp), "one\ntwo\nthree");
    }

    #[test]
    fn extract_falls_through_empty_output_to_choices() {
        let resp = CompletionResponse {
            output: vec![OutputItem::default()],
            choices: vec![ChatChoice {
                content: Some("chat".into()),
            }],
            ..Default::default()
        };
        assert_eq!(extract_text(&resp), "chat");
        assert_eq!(extract_text(&CompletionResponse::default()), "");
    }

    #[test]
    fn parses_bare_json_with_prose() {
        let parsed = parse_planner_text("Sure! Here it is: {\"steps\": []} Let me know.").unwrap();
        assert_eq!(parsed, json!({ "steps": [] }));
    }

    #[test]
    fn fenced_block_takes_priority() {
        let text = "Draft {not json}\n```JSON\n{\"notes\": \"fenced\"}\n```\ntrailing }";
        assert_eq!(parse_planner_text(text).unwrap(), json!({ "notes": "fenced" }));
    }

    #[test]
    fn unparseable_text_is_none() {
        assert!(parse_planner_text("I cannot help with that.").is_none());
        assert!(parse_planner_text("} backwards {").is_none());
        assert!(parse_planner_text("{ \"steps\": [ }").is_none());
        assert!(parse_planner_text("   ").is_none());
    }

    #[test]
    fn refusal_reads_role_variants() {
        let r = extract_refusal(&json!({
            "status": "REFUSED",
            "reason": "unsafe",
            "message": "Cannot file on behalf of client",
            "code": "policy_block",
            "required_role": "manager"
        }))
        .unwrap();
        assert_eq!(r.reason, "unsafe");
        assert_eq!(r.code.as_deref(), Some("policy_block"));
        assert_eq!(r.required_role, Some(Role::Manager));

        let r = extract_refusal(&json!({ "status": "refused", "minRoleRequired": "SYSTEM_ADMIN" })).unwrap();
        assert_eq!(r.reason, "refused");
        assert_eq!(r.message, "The planner declined to provide a plan.");
        assert_eq!(r.required_role, Some(Role::SystemAdmin));
    }

    #[test]
    fn refusal_with_unknown_role_drops_role() {
        let r = extract_refusal(&json!({ "status": "refused", "requiredRole": "PARTNER" })).unwrap();
        assert!(r.required_role.is_none());
    }

    #[test]
    fn non_refusal_payloads_are_none() {
        assert!(extract_refusal(&json!({ "status": "ok", "steps": [] })).is_none());
        assert!(extract_refusal(&json!({ "steps": [] })).is_none());
        assert!(extract_refusal(&json!([1, 2])).is_none());
    }
}
