//! Plan generation loop: admission, bounded model attempts, and the
//! deterministic fallback.
//!
//! Entry point: [`PlanGenerator::generate`]. Generation never returns an
//! error; every abnormal path is folded into the [`GenerationResult`].

use std::sync::Arc;

use serde_json::json;
use tracing::Instrument;

use ap_domain::config::PlannerConfig;
use ap_domain::error::{Error, Result};
use ap_domain::plan::{GenerationOutcome, GenerationResult, PlanDocument, PlanRefusal};
use ap_domain::trace::{EventLog, PlannerEvent};
use ap_providers::util::with_cancellation;
use ap_providers::{CompletionProvider, CompletionRequest};

use crate::debug::DebugLogEntry;
use crate::fallback::build_fallback_plan;
use crate::parse::{extract_refusal, parse_planner_response};
use crate::policy::check_admission;
use crate::prompt::{build_planner_messages, render_prompt};
use crate::request::PlanRequest;
use crate::sanitize::sanitise_plan_document;

pub const PROVIDER_UNAVAILABLE: &str = "planner_model_unavailable";
pub const EMPTY_PLAN_RESPONSE: &str = "empty_plan_response";
pub const PLAN_MISSING_STEPS: &str = "plan_missing_steps";
const CANCELLED: &str = "cancelled";

/// What a single completed attempt produced.
enum Attempt {
    Plan(PlanDocument),
    Refused(PlanRefusal),
}

/// Generates plans against an optional completion provider.
///
/// Holds only read-only configuration, so one generator can serve
/// concurrent requests.
#[derive(Clone)]
pub struct PlanGenerator {
    config: PlannerConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl PlanGenerator {
    pub fn new(config: PlannerConfig, provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { config, provider }
    }

    pub async fn generate(&self, req: &PlanRequest) -> GenerationResult {
        let span = tracing::info_span!(
            "plan_generation",
            agent_type = %req.agent_type,
            user_role = %req.user_role,
            model = %self.config.model,
        );
        self.generate_inner(req).instrument(span).await
    }

    async fn generate_inner(&self, req: &PlanRequest) -> GenerationResult {
        let mut events = EventLog::new();
        let mut usage = None;

        if let Some(refusal) = check_admission(req) {
            events.record(PlannerEvent::AdmissionDenied {
                user_role: req.user_role.to_string(),
                required_role: refusal
                    .required_role
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
            });
            return self.finish(
                req,
                GenerationOutcome::Refused { refusal },
                0,
                false,
                usage,
                None,
                events,
            );
        }

        let Some(provider) = self.provider.as_ref() else {
            events.record(PlannerEvent::ProviderUnavailable);
            events.record(PlannerEvent::FallbackUsed {
                reason: PROVIDER_UNAVAILABLE.into(),
            });
            let plan = build_fallback_plan(req, &self.config.plan_schema_version, &mut events);
            return self.finish(
                req,
                GenerationOutcome::Success { plan },
                0,
                true,
                usage,
                Some(PROVIDER_UNAVAILABLE.into()),
                events,
            );
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error: Option<String> = None;

        while attempts < max_attempts {
            if req.is_cancelled() {
                return self.cancelled(req, attempts, usage, events);
            }
            attempts += 1;
            events.record(PlannerEvent::AttemptStarted { attempt: attempts });

            match self
                .run_attempt(provider.as_ref(), req, attempts, &mut usage, &mut events)
                .await
            {
                Ok(Attempt::Plan(plan)) => {
                    return self.finish(
                        req,
                        GenerationOutcome::Success { plan },
                        attempts,
                        false,
                        usage,
                        last_error,
                        events,
                    );
                }
                Ok(Attempt::Refused(refusal)) => {
                    events.record(PlannerEvent::ModelRefused {
                        attempt: attempts,
                        reason: refusal.reason.clone(),
                    });
                    return self.finish(
                        req,
                        GenerationOutcome::Refused { refusal },
                        attempts,
                        false,
                        usage,
                        last_error,
                        events,
                    );
                }
                Err(e) if e.is_cancelled() || req.is_cancelled() => {
                    return self.cancelled(req, attempts, usage, events);
                }
                Err(e) => {
                    let error = e.to_string();
                    events.record(PlannerEvent::AttemptFailed {
                        attempt: attempts,
                        error: error.clone(),
                    });
                    last_error = Some(error);
                }
            }
        }

        events.record(PlannerEvent::FallbackUsed {
            reason: last_error.clone().unwrap_or_default(),
        });
        let plan = build_fallback_plan(req, &self.config.plan_schema_version, &mut events);
        self.finish(
            req,
            GenerationOutcome::Success { plan },
            attempts,
            true,
            usage,
            last_error,
            events,
        )
    }

    async fn run_attempt(
        &self,
        provider: &dyn CompletionProvider,
        req: &PlanRequest,
        attempt: u32,
        usage: &mut Option<serde_json::Value>,
        events: &mut EventLog,
    ) -> Result<Attempt> {
        let messages = build_planner_messages(req);
        let input = render_prompt(&messages);
        let request_payload = json!({ "model": self.config.model, "input": messages });

        let resp = provider
            .complete(CompletionRequest {
                model: self.config.model.clone(),
                input,
                cancel: req.cancel.clone(),
            })
            .await?;

        usage.clone_from(&resp.usage);

        if let Some(logger) = &req.debug_logger {
            let entry = DebugLogEntry {
                endpoint: "responses.create".into(),
                response: resp.raw_body(),
                request_payload,
                metadata: json!({ "agentType": req.agent_type, "attempt": attempt }),
            };
            match with_cancellation(req.cancel.as_ref(), logger.log(entry)).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => events.record(PlannerEvent::DebugLogFailed {
                    attempt,
                    error: e.to_string(),
                }),
            }
        }

        let payload = parse_planner_response(&resp)
            .ok_or_else(|| Error::Other(EMPTY_PLAN_RESPONSE.into()))?;

        if let Some(refusal) = extract_refusal(&payload) {
            return Ok(Attempt::Refused(refusal));
        }

        let plan = sanitise_plan_document(&payload, req, &self.config.plan_schema_version, events);
        if plan.steps.is_empty() {
            return Err(Error::Other(PLAN_MISSING_STEPS.into()));
        }
        Ok(Attempt::Plan(plan))
    }

    fn cancelled(
        &self,
        req: &PlanRequest,
        attempts: u32,
        usage: Option<serde_json::Value>,
        mut events: EventLog,
    ) -> GenerationResult {
        events.record(PlannerEvent::GenerationCancelled { attempt: attempts });
        self.finish(
            req,
            GenerationOutcome::Cancelled,
            attempts,
            false,
            usage,
            Some(CANCELLED.into()),
            events,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        req: &PlanRequest,
        outcome: GenerationOutcome,
        attempts: u32,
        is_fallback: bool,
        usage: Option<serde_json::Value>,
        last_error: Option<String>,
        events: EventLog,
    ) -> GenerationResult {
        let result = GenerationResult {
            outcome,
            persona_version: req.agent_type.persona_version().into(),
            policy_pack_version: self.config.policy_pack_version.clone(),
            model: self.config.model.clone(),
            attempts,
            is_fallback,
            usage,
            last_error,
            events: events.into_events(),
        };
        tracing::info!(
            status = result.status(),
            attempts,
            is_fallback,
            "plan generation finished"
        );
        result
    }
}
