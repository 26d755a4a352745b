//! Admission control and tool allowlisting.

use ap_domain::plan::PlanRefusal;
use ap_domain::role::has_sufficient_role;
use ap_domain::tool::ToolKey;
use ap_domain::trace::{EventLog, PlannerEvent};

use crate::request::PlanRequest;

pub const INSUFFICIENT_ROLE: &str = "insufficient_role";

/// Refuse the request up front when the caller's role is below the
/// context's `minRoleRequired`. `None` means the request is admitted.
pub fn check_admission(req: &PlanRequest) -> Option<PlanRefusal> {
    let required = req.request_context.as_ref()?.min_role_required?;
    if has_sufficient_role(req.user_role, required) {
        return None;
    }
    Some(PlanRefusal {
        reason: INSUFFICIENT_ROLE.into(),
        message: format!("This request requires {required} permissions."),
        code: Some(INSUFFICIENT_ROLE.into()),
        required_role: Some(required),
    })
}

/// Where a tool key came from, for rejection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    Plan,
    Requested,
}

impl ToolSource {
    fn as_str(self) -> &'static str {
        match self {
            ToolSource::Plan => "plan",
            ToolSource::Requested => "requested",
        }
    }
}

/// Resolve `key` against the allowlist, recording a rejection otherwise.
pub fn admit_tool(key: &str, source: ToolSource, events: &mut EventLog) -> Option<ToolKey> {
    let admitted = ToolKey::lookup(key);
    if admitted.is_none() {
        events.record(PlannerEvent::ToolRejected {
            tool_key: key.to_string(),
            source: source.as_str().into(),
        });
    }
    admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_domain::plan::{AgentType, RequestContext};
    use ap_domain::role::Role;

    fn request(user: Role, min: Option<Role>) -> PlanRequest {
        PlanRequest::new(AgentType::Audit, user).with_context(RequestContext {
            min_role_required: min,
            ..Default::default()
        })
    }

    #[test]
    fn admits_without_minimum() {
        assert!(check_admission(&request(Role::Observer, None)).is_none());
        assert!(check_admission(&PlanRequest::new(AgentType::Tax, Role::Observer)).is_none());
    }

    #[test]
    fn admits_equal_or_higher_rank() {
        assert!(check_admission(&request(Role::Manager, Some(Role::Manager))).is_none());
        assert!(check_admission(&request(Role::SystemAdmin, Some(Role::Manager))).is_none());
        assert!(check_admission(&request(Role::Reviewer, Some(Role::Staff))).is_none());
    }

    #[test]
    fn refuses_lower_rank() {
        let refusal = check_admission(&request(Role::Staff, Some(Role::Manager))).unwrap();
        assert_eq!(refusal.reason, "insufficient_role");
        assert_eq!(refusal.code.as_deref(), Some("insufficient_role"));
        assert_eq!(refusal.required_role, Some(Role::Manager));
        assert_eq!(refusal.message, "This request requires MANAGER permissions.");
    }

    #[test]
    fn admit_tool_records_rejections() {
        let mut events = EventLog::new();
        assert_eq!(admit_tool("rag.search", ToolSource::Plan, &mut events), Some(ToolKey::RagSearch));
        assert_eq!(admit_tool("shell.exec", ToolSource::Requested, &mut events), None);
        assert_eq!(
            events.events(),
            &[PlannerEvent::ToolRejected {
                tool_key: "shell.exec".into(),
                source: "requested".into(),
            }]
        );
    }
}
