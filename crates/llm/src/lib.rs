pub mod analysis;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use analysis::{AnalysisClient, AnalysisError, AnalysisRequest, LlmAnalysisClient, UnconfiguredClient};
pub use provider::{CompletionOptions, LlmError, LlmProvider, Message, Role};
