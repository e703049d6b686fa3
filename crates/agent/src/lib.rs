//! AI assistant for the Info Hub bot
//!
//! - `llm`: the `TextCompletionService` capability and its OpenAI-compatible client
//! - `guardrails`: input limits checked before a prompt is sent
//! - `runtime`: `AgentRuntime`, which builds the ask/summarize/explain prompts
//!
//! The runtime never formats chat replies; that is the Slack layer's job.

pub mod guardrails;
pub mod llm;
pub mod runtime;

pub use guardrails::{GuardrailDecision, GuardrailPolicy, PromptKind};
pub use llm::{CompletionCapability, CompletionError, CompletionRequest, TextCompletionService};
pub use runtime::{AgentRuntime, AssistantError};
