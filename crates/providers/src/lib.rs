pub mod openai_compat;
pub mod registry;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use registry::build_provider;
pub use traits::{CompletionProvider, CompletionRequest, CompletionResponse};
