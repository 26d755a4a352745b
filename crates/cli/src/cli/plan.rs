use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use tokio_util::sync::CancellationToken;

use ap_domain::config::Config;
use ap_domain::plan::{AgentType, GenerationOutcome, GenerationResult, RequestContext, RequestedTool};
use ap_domain::role::Role;
use ap_planner::{PlanGenerator, PlanRequest, TracingDebugLogger};

/// Exit code when the request is refused.
pub const EXIT_REFUSED: i32 = 2;
/// Exit code when generation is interrupted.
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Agent persona: CLOSE, TAX, AUDIT, ADVISORY or CLIENT.
    #[arg(long)]
    pub agent_type: AgentType,
    /// Caller role. Unrecognised roles are treated as OBSERVER.
    #[arg(long, default_value = "STAFF")]
    pub role: String,
    /// Free-text description of the request.
    #[arg(long)]
    pub description: Option<String>,
    /// Policy flag as `key=true|false`. Repeatable.
    #[arg(long = "flag", value_parser = parse_flag)]
    pub flags: Vec<(String, bool)>,
    /// Explicitly requested tool as `key` or `key:ROLE`. Repeatable.
    #[arg(long = "tool", value_parser = parse_tool)]
    pub tools: Vec<RequestedTool>,
    /// Minimum caller role for the request.
    #[arg(long)]
    pub min_role: Option<Role>,
    /// Full request context as a JSON object, echoed onto the plan as given.
    #[arg(
        long,
        value_parser = parse_context,
        conflicts_with_all = ["description", "flags", "tools", "min_role"]
    )]
    pub context: Option<serde_json::Value>,
    /// Require the plan to cite evidence.
    #[arg(long)]
    pub enforce_citations: bool,
    /// Log raw model exchanges at DEBUG level.
    #[arg(long)]
    pub debug_log: bool,
    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

fn parse_flag(raw: &str) -> Result<(String, bool), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=bool, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty flag name in '{raw}'"));
    }
    let value = value
        .trim()
        .parse::<bool>()
        .map_err(|_| format!("flag '{key}' must be true or false"))?;
    Ok((key.to_string(), value))
}

fn parse_tool(raw: &str) -> Result<RequestedTool, String> {
    let (key, min_role) = match raw.split_once(':') {
        Some((key, role)) => (key, Some(role.parse::<Role>().map_err(|e| e.to_string())?)),
        None => (raw, None),
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty tool key in '{raw}'"));
    }
    Ok(RequestedTool {
        tool_key: key.to_string(),
        min_role,
    })
}

fn parse_context(raw: &str) -> Result<serde_json::Value, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("context must be a JSON object".into());
    }
    Ok(value)
}

/// Translate parsed arguments into a [`PlanRequest`].
pub fn build_request(args: &PlanArgs) -> anyhow::Result<PlanRequest> {
    let context = RequestContext {
        description: args.description.clone(),
        flags: args.flags.iter().cloned().collect(),
        requested_tools: args.tools.clone(),
        min_role_required: args.min_role,
        ..Default::default()
    };
    let mut req = PlanRequest::new(args.agent_type, Role::from_str_lossy(&args.role))
        .with_citations(args.enforce_citations);
    if let Some(raw) = &args.context {
        req = req
            .with_raw_context(raw.clone())
            .context("invalid --context")?;
    } else if context != RequestContext::default() {
        req = req.with_context(context);
    }
    if args.debug_log {
        req = req.with_debug_logger(Arc::new(TracingDebugLogger));
    }
    Ok(req)
}

/// Run one generation and print it. Returns the process exit code.
pub async fn run(config: &Config, args: &PlanArgs) -> anyhow::Result<i32> {
    let provider = match ap_providers::build_provider(&config.llm) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!(error = %e, "completion provider unavailable, continuing without it");
            None
        }
    };
    let generator = PlanGenerator::new(config.planner.clone(), provider);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let req = build_request(args)?.with_cancel(cancel);
    let result = generator.generate(&req).await;
    ctrl_c.abort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_summary(&result));
    }

    Ok(match result.outcome {
        GenerationOutcome::Success { .. } => 0,
        GenerationOutcome::Refused { .. } => EXIT_REFUSED,
        GenerationOutcome::Cancelled => EXIT_CANCELLED,
    })
}

/// Human-readable rendering of a generation result.
pub fn render_summary(result: &GenerationResult) -> String {
    let mut out = String::new();
    let fallback = if result.is_fallback { " (fallback)" } else { "" };
    let _ = writeln!(out, "status: {}{fallback}", result.status());
    let _ = writeln!(
        out,
        "persona: {}  policy pack: {}  model: {}",
        result.persona_version, result.policy_pack_version, result.model
    );
    let _ = write!(out, "attempts: {}", result.attempts);
    if let Some(err) = &result.last_error {
        let _ = write!(out, "  last error: {err}");
    }
    out.push('\n');

    match &result.outcome {
        GenerationOutcome::Success { plan } => {
            for step in &plan.steps {
                let _ = writeln!(out, "\n{}. {}", step.step_index, step.title);
                let _ = writeln!(out, "   {}", step.summary);
                if let Some(exit) = &step.exit_criteria {
                    let _ = writeln!(out, "   exit: {exit}");
                }
                let keys: Vec<String> = step.tool_keys().map(|k| k.to_string()).collect();
                if !keys.is_empty() {
                    let _ = writeln!(out, "   tools: {}", keys.join(", "));
                }
            }
        }
        GenerationOutcome::Refused { refusal } => {
            let _ = writeln!(out, "\nrefused ({}): {}", refusal.reason, refusal.message);
            if let Some(role) = refusal.required_role {
                let _ = writeln!(out, "required role: {role}");
            }
        }
        GenerationOutcome::Cancelled => {}
    }
    out
}
