//! Deterministic four-step plan used when the model path is unavailable
//! or exhausted.

use serde_json::{json, Map};

use ap_domain::plan::{PlanDocument, PlanStep, ToolIntent};
use ap_domain::tool::ToolKey;
use ap_domain::trace::EventLog;

use crate::request::PlanRequest;
use crate::sanitize::{attach_requested_tools, now_iso};

pub const NO_DESCRIPTION: &str = "No description supplied.";

const TOP_K_WITH_CITATIONS: u32 = 8;
const TOP_K_DEFAULT: u32 = 5;

fn step(index: u32, title: &str, summary: String, exit: &str) -> PlanStep {
    PlanStep {
        step_index: index,
        title: title.into(),
        summary,
        exit_criteria: Some(exit.into()),
        depends_on: None,
        tool_intents: None,
    }
}

pub fn build_fallback_plan(
    req: &PlanRequest,
    schema_version: &str,
    events: &mut EventLog,
) -> PlanDocument {
    let description = req.description().unwrap_or(NO_DESCRIPTION);
    let top_k = if req.enforce_citations {
        TOP_K_WITH_CITATIONS
    } else {
        TOP_K_DEFAULT
    };

    let mut rag_inputs = Map::new();
    rag_inputs.insert("query".into(), json!(description));
    rag_inputs.insert("topK".into(), json!(top_k));

    let mut evidence = step(
        1,
        "Gather authoritative evidence",
        "Collect knowledge base excerpts, prior memos, and control documentation that support the request.".into(),
        "At least two high-quality evidence sources curated for downstream drafting.",
    );
    evidence.tool_intents = Some(vec![ToolIntent {
        tool_key: ToolKey::RagSearch,
        purpose: "Retrieve relevant knowledge base content to ground the agent response.".into(),
        inputs: Some(rag_inputs),
        notes: None,
        min_role: None,
    }]);

    let mut delivery = step(
        3,
        "Prepare user delivery",
        "Package the answer, queue any notifications, and call attention to outstanding approvals \
         or filings before closing the loop with the user."
            .into(),
        "User-ready summary or notification queued with acknowledgements of pending follow-ups.",
    );
    delivery.tool_intents = Some(vec![ToolIntent {
        tool_key: ToolKey::NotifyUser,
        purpose: "Send a summary notification or capture next actions for the requestor.".into(),
        inputs: None,
        notes: None,
        min_role: None,
    }]);

    let mut steps = vec![
        step(
            0,
            "Frame the engagement",
            format!(
                "Confirm scope, assumptions, and risk factors for the {} workflow. \
                 Capture relevant policy flags and user objectives.",
                req.agent_type.as_str().to_ascii_lowercase()
            ),
            "Documented summary including key controls/risks and confirmation of scope.",
        ),
        evidence,
        step(
            2,
            "Draft proposed answer and controls",
            "Synthesize findings into a structured response, highlighting required approvals, \
             downstream tasks, and open questions."
                .into(),
            "Draft response including action items, approvals required, and explicit references to evidence.",
        ),
        delivery,
    ];

    attach_requested_tools(&mut steps, req.request_context.as_ref(), events);

    PlanDocument {
        plan_version: schema_version.to_string(),
        agent_type: req.agent_type,
        created_at: now_iso(),
        created_by_role: req.user_role,
        requires_citations: req.enforce_citations,
        steps,
        notes: Some(description.to_string()),
        request_context: req.context_echo(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_domain::plan::{AgentType, RequestContext, RequestedTool};
    use ap_domain::role::Role;

    #[test]
    fn four_canonical_steps_in_order() {
        let req = PlanRequest::new(AgentType::Audit, Role::Staff);
        let plan = build_fallback_plan(&req, "2025-01-15.v1", &mut EventLog::new());

        let titles: Vec<&str> = plan.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "Frame the engagement",
                "Gather authoritative evidence",
                "Draft proposed answer and controls",
                "Prepare user delivery"
            ]
        );
        let indices: Vec<u32> = plan.steps.iter().map(|s| s.step_index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
        assert!(plan.steps[0].summary.contains("for the audit workflow"));
        assert_eq!(plan.plan_version, "2025-01-15.v1");
        assert_eq!(plan.notes.as_deref(), Some(NO_DESCRIPTION));
        assert!(plan.request_context.is_none());
    }

    #[test]
    fn rag_search_query_uses_trimmed_description() {
        let req = PlanRequest::new(AgentType::Tax, Role::Manager)
            .with_context(RequestContext {
                description: Some("  Malta VAT Q3  ".into()),
                ..Default::default()
            })
            .with_citations(true);
        let plan = build_fallback_plan(&req, "v", &mut EventLog::new());

        let rag = &plan.steps[1].tool_intents.as_ref().unwrap()[0];
        assert_eq!(rag.tool_key, ToolKey::RagSearch);
        let inputs = rag.inputs.as_ref().unwrap();
        assert_eq!(inputs["query"], "Malta VAT Q3");
        assert_eq!(inputs["topK"], 8);
        assert!(plan.requires_citations);
        assert_eq!(plan.notes.as_deref(), Some("Malta VAT Q3"));
    }

    #[test]
    fn blank_description_uses_placeholder() {
        let req = PlanRequest::new(AgentType::Client, Role::Staff).with_context(RequestContext {
            description: Some("   ".into()),
            ..Default::default()
        });
        let plan = build_fallback_plan(&req, "v", &mut EventLog::new());
        assert_eq!(plan.notes.as_deref(), Some(NO_DESCRIPTION));
        let rag = &plan.steps[1].tool_intents.as_ref().unwrap()[0];
        assert_eq!(rag.inputs.as_ref().unwrap()["topK"], 5);
    }

    #[test]
    fn requested_tools_land_on_delivery_step() {
        let req = PlanRequest::new(AgentType::Close, Role::Manager).with_context(RequestContext {
            requested_tools: vec![
                RequestedTool {
                    tool_key: "notify.user".into(),
                    min_role: None,
                },
                RequestedTool {
                    tool_key: "trial_balance.get".into(),
                    min_role: Some(Role::Reviewer),
                },
            ],
            ..Default::default()
        });
        let plan = build_fallback_plan(&req, "v", &mut EventLog::new());
        let delivery = plan.steps[3].tool_intents.as_ref().unwrap();
        let keys: Vec<ToolKey> = delivery.iter().map(|i| i.tool_key).collect();
        assert_eq!(keys, [ToolKey::NotifyUser, ToolKey::TrialBalanceGet]);
        assert_eq!(delivery[1].min_role, Some(Role::Reviewer));
    }
}
