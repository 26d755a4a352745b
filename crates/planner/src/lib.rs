pub mod debug;
pub mod fallback;
pub mod parse;
pub mod policy;
pub mod prompt;
pub mod request;
pub mod runtime;
pub mod sanitize;

// Re-exports for convenience.
pub use debug::{DebugLogEntry, DebugLogger, TracingDebugLogger};
pub use fallback::build_fallback_plan;
pub use request::PlanRequest;
pub use runtime::PlanGenerator;
pub use sanitize::{attach_requested_tools, sanitise_plan_document};
