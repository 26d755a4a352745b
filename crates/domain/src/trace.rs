use serde::{Deserialize, Serialize};

/// Structured events emitted while generating a plan.
///
/// Every event is logged through `tracing` and also returned to the caller
/// on the generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlannerEvent {
    AdmissionDenied {
        user_role: String,
        required_role: String,
    },
    ProviderUnavailable,
    AttemptStarted {
        attempt: u32,
    },
    AttemptFailed {
        attempt: u32,
        error: String,
    },
    ToolRejected {
        tool_key: String,
        /// `"plan"` for model output, `"requested"` for caller context.
        source: String,
    },
    StepDropped {
        position: usize,
        reason: String,
    },
    ModelRefused {
        attempt: u32,
        reason: String,
    },
    FallbackUsed {
        reason: String,
    },
    DebugLogFailed {
        attempt: u32,
        error: String,
    },
    GenerationCancelled {
        attempt: u32,
    },
}

impl PlannerEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        match self {
            PlannerEvent::ToolRejected { .. }
            | PlannerEvent::AttemptFailed { .. }
            | PlannerEvent::DebugLogFailed { .. }
            | PlannerEvent::FallbackUsed { .. } => {
                tracing::warn!(planner_event = %json, "ap_event");
            }
            _ => tracing::info!(planner_event = %json, "ap_event"),
        }
    }
}

/// Collects planner events for one generation, emitting each as it lands.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<PlannerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: PlannerEvent) {
        event.emit();
        self.events.push(event);
    }

    pub fn events(&self) -> &[PlannerEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<PlannerEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let ev = PlannerEvent::ToolRejected {
            tool_key: "shell.exec".into(),
            source: "plan".into(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "tool_rejected");
        assert_eq!(json["tool_key"], "shell.exec");
    }

    #[test]
    fn log_keeps_insertion_order() {
        let mut log = EventLog::new();
        log.record(PlannerEvent::AttemptStarted { attempt: 1 });
        log.record(PlannerEvent::ProviderUnavailable);
        assert_eq!(log.events().len(), 2);
        assert_eq!(
            log.into_events()[0],
            PlannerEvent::AttemptStarted { attempt: 1 }
        );
    }
}
