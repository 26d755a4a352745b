use std::fmt;
use std::sync::Arc;

use ap_domain::error::Result;
use ap_domain::plan::{AgentType, RequestContext};
use ap_domain::role::Role;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::debug::DebugLogger;

/// Input to a single plan generation. Built per call and dropped afterwards.
#[derive(Clone)]
pub struct PlanRequest {
    pub agent_type: AgentType,
    pub user_role: Role,
    /// Typed view the planner reads.
    pub request_context: Option<RequestContext>,
    /// Caller's JSON as received, echoed onto the plan.
    raw_context: Option<Value>,
    /// Whether the plan must cite evidence.
    pub enforce_citations: bool,
    /// Forwarded to every completion call.
    pub cancel: Option<CancellationToken>,
    pub debug_logger: Option<Arc<dyn DebugLogger>>,
}

impl PlanRequest {
    pub fn new(agent_type: AgentType, user_role: Role) -> Self {
        Self {
            agent_type,
            user_role,
            request_context: None,
            raw_context: None,
            enforce_citations: false,
            cancel: None,
            debug_logger: None,
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.request_context = Some(context);
        self.raw_context = None;
        self
    }

    /// Attach a context received as JSON. The value is kept as given and
    /// echoed onto the plan unchanged.
    pub fn with_raw_context(mut self, raw: Value) -> Result<Self> {
        self.request_context = Some(serde_json::from_value(raw.clone())?);
        self.raw_context = Some(raw);
        Ok(self)
    }

    pub fn with_citations(mut self, enforce: bool) -> Self {
        self.enforce_citations = enforce;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_debug_logger(mut self, logger: Arc<dyn DebugLogger>) -> Self {
        self.debug_logger = Some(logger);
        self
    }

    /// Trimmed context description, if one was supplied and is non-blank.
    pub fn description(&self) -> Option<&str> {
        self.request_context
            .as_ref()
            .and_then(|ctx| ctx.description.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// The context to record on the plan: the caller's JSON when one was
    /// supplied, otherwise the serialized typed context.
    pub fn context_echo(&self) -> Option<Value> {
        match &self.raw_context {
            Some(raw) => Some(raw.clone()),
            None => self
                .request_context
                .as_ref()
                .and_then(|ctx| serde_json::to_value(ctx).ok()),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

impl fmt::Debug for PlanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanRequest")
            .field("agent_type", &self.agent_type)
            .field("user_role", &self.user_role)
            .field("request_context", &self.request_context)
            .field("raw_context", &self.raw_context.is_some())
            .field("enforce_citations", &self.enforce_citations)
            .field("cancel", &self.cancel.is_some())
            .field("debug_logger", &self.debug_logger.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_context_is_echoed_as_given() {
        let raw = json!({ "flags": {}, "requestedTools": [], "minRoleRequired": "staff" });
        let req = PlanRequest::new(AgentType::Close, Role::Staff)
            .with_raw_context(raw.clone())
            .unwrap();
        assert_eq!(
            req.request_context.as_ref().unwrap().min_role_required,
            Some(Role::Staff)
        );
        assert_eq!(req.context_echo(), Some(raw));
    }

    #[test]
    fn typed_context_echo_is_serialized_view() {
        let req = PlanRequest::new(AgentType::Close, Role::Staff).with_context(RequestContext {
            description: Some("Close books".into()),
            ..Default::default()
        });
        assert_eq!(
            req.context_echo(),
            Some(json!({ "description": "Close books", "flags": {}, "requestedTools": [] }))
        );
        assert!(PlanRequest::new(AgentType::Tax, Role::Staff).context_echo().is_none());
    }

    #[test]
    fn raw_context_with_unknown_role_is_rejected() {
        let err = PlanRequest::new(AgentType::Tax, Role::Staff)
            .with_raw_context(json!({ "minRoleRequired": "PARTNER" }))
            .unwrap_err();
        assert!(err.to_string().starts_with("JSON:"));
    }
}
