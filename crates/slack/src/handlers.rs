use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infohub_agent::{AgentRuntime, AssistantError, PromptKind};
use infohub_core::RateLimiter;
use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::catalog::{CommandCategory, CommandName, BOT_INFO};
use crate::commands::{CommandHandler, CommandRouter, HandlerError, Invocation};
use crate::replies::{self, ReplyBuilder, ReplyPayload, StatusReport};

pub const PING_REPLIES: [&str; 4] = [
    "pong — bot online ✅",
    "🏓 pong! I'm here and ready to help!",
    "✅ pong — all systems operational!",
    "🤖 pong — Info Hub Bot at your service!",
];

/// Builds a router with every implemented command bound.
pub fn default_router(
    assistant: Arc<AgentRuntime>,
    rate_limiter: Arc<dyn RateLimiter>,
    started: ProcessStart,
) -> CommandRouter {
    let mut router = CommandRouter::new(rate_limiter);
    router.register(CommandName::Help, HelpHandler);
    router.register(
        CommandName::Status,
        StatusHandler { started, ai_available: assistant.is_available() },
    );
    router.register(CommandName::Info, InfoHandler);
    router.register(CommandName::Ping, PingHandler);
    router.register(CommandName::Ask, AiHandler::new(PromptKind::Ask, assistant.clone()));
    router.register(
        CommandName::Summarize,
        AiHandler::new(PromptKind::Summarize, assistant.clone()),
    );
    router.register(CommandName::Explain, AiHandler::new(PromptKind::Explain, assistant));
    router
}

/// Process start, captured once at bootstrap for uptime reporting.
#[derive(Clone, Copy, Debug)]
pub struct ProcessStart {
    pub monotonic: Instant,
    pub wall_clock: DateTime<Utc>,
}

impl ProcessStart {
    pub fn now() -> Self {
        Self { monotonic: Instant::now(), wall_clock: Utc::now() }
    }
}

pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(&self, invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
        let Some(requested) = invocation.args.first() else {
            return Ok(replies::help_overview(BOT_INFO.name));
        };

        Ok(match CommandCategory::from_alias(requested) {
            Some(category) => replies::help_category(category),
            None => replies::unknown_category(requested),
        })
    }
}

pub struct StatusHandler {
    started: ProcessStart,
    ai_available: bool,
}

#[async_trait]
impl CommandHandler for StatusHandler {
    async fn handle(&self, invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
        let report = StatusReport {
            version: BOT_INFO.version.to_owned(),
            uptime: self.started.monotonic.elapsed(),
            response_time_ms: invocation.received_at.elapsed().as_millis(),
            ai_available: self.ai_available,
            last_deployed: self.started.wall_clock.format("%Y-%m-%d").to_string(),
        };
        Ok(replies::status(&report))
    }
}

pub struct InfoHandler;

#[async_trait]
impl CommandHandler for InfoHandler {
    async fn handle(&self, _invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
        Ok(replies::bot_info(&BOT_INFO))
    }
}

pub struct PingHandler;

#[async_trait]
impl CommandHandler for PingHandler {
    async fn handle(&self, _invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
        let reply = PING_REPLIES.choose(&mut rand::thread_rng()).copied().unwrap_or(PING_REPLIES[0]);
        Ok(ReplyPayload::new(reply))
    }
}

pub struct AiHandler {
    kind: PromptKind,
    assistant: Arc<AgentRuntime>,
}

impl AiHandler {
    pub fn new(kind: PromptKind, assistant: Arc<AgentRuntime>) -> Self {
        Self { kind, assistant }
    }

    async fn run(&self, input: &str) -> Result<String, AssistantError> {
        match self.kind {
            PromptKind::Ask => self.assistant.ask(input).await,
            PromptKind::Summarize => self.assistant.summarize(input).await,
            PromptKind::Explain => self.assistant.explain(input).await,
        }
    }

    fn render(&self, input: &str, output: &str) -> ReplyPayload {
        match self.kind {
            PromptKind::Ask => ReplyBuilder::titled("🤖", "AI Assistant")
                .line(format!("*Question:* {input}"))
                .blank()
                .line("*Answer:*")
                .raw(output)
                .build(),
            PromptKind::Summarize => ReplyBuilder::titled("📝", "Text Summary")
                .line(format!("*Original length:* {} characters", input.chars().count()))
                .line(format!("*Summary length:* {} characters", output.chars().count()))
                .blank()
                .line("*Summary:*")
                .raw(output)
                .build(),
            PromptKind::Explain => ReplyBuilder::titled("🎓", "Topic Explanation")
                .line(format!("*Topic:* {input}"))
                .blank()
                .line("*Explanation:*")
                .raw(output)
                .build(),
        }
    }

    fn failure_prefix(&self, input: &str) -> String {
        match self.kind {
            PromptKind::Ask => "Sorry, I couldn't process your question".to_owned(),
            PromptKind::Summarize => "Sorry, I couldn't summarize the text".to_owned(),
            PromptKind::Explain => format!("Sorry, I couldn't explain \"{input}\""),
        }
    }
}

#[async_trait]
impl CommandHandler for AiHandler {
    async fn handle(&self, invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
        let input = invocation.raw_args.as_str();
        match self.run(input).await {
            Ok(output) => {
                info!(
                    event_name = "command.ai.completed",
                    correlation_id = %invocation.correlation_id,
                    command = self.kind.command(),
                    "assistant reply ready"
                );
                Ok(self.render(input, &output))
            }
            Err(AssistantError::Completion(error)) => {
                warn!(
                    event_name = "command.ai.completion_failed",
                    correlation_id = %invocation.correlation_id,
                    command = self.kind.command(),
                    error = %error,
                    "completion failed"
                );
                Ok(replies::error(&format!(
                    "{}: {}",
                    self.failure_prefix(input),
                    error.user_message()
                )))
            }
            Err(other) => Ok(replies::error(&other.user_message())),
        }
    }
}
