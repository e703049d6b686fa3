use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use infohub_core::{RateDecision, RateLimiter};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::catalog::{self, CommandName};
use crate::replies::{self, ReplyPayload};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: Option<String>,
    pub args: Vec<String>,
    pub raw_args: String,
}

/// Splits mention text into a lower-cased command name and its arguments.
///
/// One leading `<@bot_user_id>` token is removed first. When the bot id is
/// unknown (empty), any single leading user mention is removed instead.
pub fn parse(text: Option<&str>, bot_user_id: &str) -> ParsedCommand {
    let Some(text) = text else {
        return ParsedCommand::default();
    };

    let text = strip_leading_mention(text.trim_start(), bot_user_id);
    let mut parts = text.split_whitespace();
    let Some(name) = parts.next() else {
        return ParsedCommand::default();
    };

    let args = parts.map(str::to_owned).collect::<Vec<_>>();
    let raw_args = args.join(" ");
    ParsedCommand { name: Some(name.to_lowercase()), args, raw_args }
}

fn strip_leading_mention<'a>(text: &'a str, bot_user_id: &str) -> &'a str {
    if !bot_user_id.is_empty() {
        let mention = format!("<@{bot_user_id}>");
        return text.strip_prefix(mention.as_str()).unwrap_or(text);
    }

    match text.strip_prefix("<@").and_then(|rest| rest.split_once('>')) {
        Some((user_id, rest)) if !user_id.is_empty() && !user_id.contains(char::is_whitespace) => {
            rest
        }
        _ => text,
    }
}

/// Everything a handler knows about the request that triggered it.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub command: CommandName,
    pub args: Vec<String>,
    pub raw_args: String,
    pub user_id: String,
    pub channel: String,
    pub correlation_id: String,
    pub received_at: Instant,
}

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub user_id: String,
    pub channel: String,
    pub correlation_id: String,
    pub received_at: Instant,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),
    #[error("handler panicked")]
    Panicked,
    #[error("handler task was cancelled")]
    Cancelled,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, invocation: &Invocation) -> Result<ReplyPayload, HandlerError>;
}

/// Maps command names to handlers. Never fails: every outcome is a reply.
pub struct CommandRouter {
    handlers: HashMap<CommandName, Arc<dyn CommandHandler>>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl CommandRouter {
    pub fn new(rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self { handlers: HashMap::new(), rate_limiter }
    }

    pub fn register<H>(&mut self, name: CommandName, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.handlers.insert(name, Arc::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub async fn route(&self, parsed: &ParsedCommand, request: &RequestContext) -> ReplyPayload {
        let (command, args, raw_args) = match parsed.name.as_deref() {
            None => (CommandName::Help, Vec::new(), String::new()),
            Some(name) => match CommandName::parse(name) {
                Some(command) => (command, parsed.args.clone(), parsed.raw_args.clone()),
                None => {
                    info!(
                        event_name = "command.unknown",
                        correlation_id = %request.correlation_id,
                        command = name,
                        "unknown command"
                    );
                    return replies::command_suggestions(name, &catalog::suggestions(name));
                }
            },
        };

        let Some(handler) = self.handlers.get(&command).cloned() else {
            return match command {
                CommandName::Help => replies::help_overview(catalog::BOT_INFO.name),
                other => replies::coming_soon(other),
            };
        };

        let bucket = command.category().rate_bucket();
        let decision = self.rate_limiter.check(&request.user_id, bucket).await;
        if let RateDecision::Denied { retry_after_secs, .. } = &decision {
            warn!(
                event_name = "command.rate_limited",
                correlation_id = %request.correlation_id,
                user_id = %request.user_id,
                command = %command,
                retry_after_secs,
                "command throttled"
            );
            return replies::warning(&decision.user_message().unwrap_or_default());
        }

        let invocation = Invocation {
            command,
            args,
            raw_args,
            user_id: request.user_id.clone(),
            channel: request.channel.clone(),
            correlation_id: request.correlation_id.clone(),
            received_at: request.received_at,
        };

        match run_isolated(handler, invocation).await {
            Ok(reply) => reply,
            Err(handler_error) => {
                error!(
                    event_name = "command.handler_failed",
                    correlation_id = %request.correlation_id,
                    command = %command,
                    error = %handler_error,
                    "command handler failed"
                );
                replies::error(&format!(
                    "Sorry, something went wrong while running `{command}`. Please try again."
                ))
            }
        }
    }
}

/// Runs the handler on its own task so a panic surfaces as an error.
async fn run_isolated(
    handler: Arc<dyn CommandHandler>,
    invocation: Invocation,
) -> Result<ReplyPayload, HandlerError> {
    let task = tokio::spawn(async move { handler.handle(&invocation).await });
    match task.await {
        Ok(result) => result,
        Err(join_error) if join_error.is_panic() => Err(HandlerError::Panicked),
        Err(_) => Err(HandlerError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use async_trait::async_trait;
    use infohub_core::config::AppConfig;
    use infohub_core::rate_limit::UnlimitedRateLimiter;
    use infohub_core::InMemoryRateLimiter;

    use super::{
        parse, CommandHandler, CommandRouter, HandlerError, Invocation, ParsedCommand,
        RequestContext,
    };
    use crate::catalog::CommandName;
    use crate::replies::ReplyPayload;

    struct Echo {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandHandler for Echo {
        async fn handle(&self, invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ReplyPayload::new(format!("{}:{}", invocation.command, invocation.raw_args)))
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler for Failing {
        async fn handle(&self, _invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
            Err(HandlerError::Failed("database on fire".to_owned()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl CommandHandler for Panicking {
        async fn handle(&self, _invocation: &Invocation) -> Result<ReplyPayload, HandlerError> {
            panic!("handler bug");
        }
    }

    fn request() -> RequestContext {
        RequestContext {
            user_id: "U1".to_owned(),
            channel: "C1".to_owned(),
            correlation_id: "Ev01".to_owned(),
            received_at: Instant::now(),
        }
    }

    fn router() -> CommandRouter {
        CommandRouter::new(Arc::new(UnlimitedRateLimiter))
    }

    #[test]
    fn parse_strips_mention_and_splits_args() {
        assert_eq!(
            parse(Some("<@U1> help ai"), "U1"),
            ParsedCommand {
                name: Some("help".to_owned()),
                args: vec!["ai".to_owned()],
                raw_args: "ai".to_owned(),
            }
        );
    }

    #[test]
    fn parse_mention_only_yields_no_name() {
        assert_eq!(parse(Some("<@U1>"), "U1"), ParsedCommand::default());
        assert_eq!(parse(Some("<@U1>   "), "U1"), ParsedCommand::default());
        assert_eq!(parse(None, "U1"), ParsedCommand::default());
    }

    #[test]
    fn parse_without_mention_uses_full_text() {
        let parsed = parse(Some("PING"), "U1");

        assert_eq!(parsed.name.as_deref(), Some("ping"));
        assert!(parsed.args.is_empty());
        assert_eq!(parsed.raw_args, "");
    }

    #[test]
    fn parse_collapses_whitespace_runs_and_keeps_arg_case() {
        let parsed = parse(Some("<@U1>\tAsk   What is   Rust?"), "U1");

        assert_eq!(parsed.name.as_deref(), Some("ask"));
        assert_eq!(parsed.args, vec!["What", "is", "Rust?"]);
        assert_eq!(parsed.raw_args, "What is Rust?");
    }

    #[test]
    fn parse_strips_only_one_leading_mention() {
        let parsed = parse(Some("<@U1> <@U1> ping"), "U1");

        assert_eq!(parsed.name.as_deref(), Some("<@u1>"));
        assert_eq!(parsed.raw_args, "ping");
    }

    #[test]
    fn parse_with_unknown_bot_id_strips_any_leading_mention() {
        assert_eq!(parse(Some("<@UBOT> status"), "").name.as_deref(), Some("status"));
        assert_eq!(parse(Some("ask <@U2> about"), "").name.as_deref(), Some("ask"));
    }

    #[tokio::test]
    async fn unknown_command_gets_suggestions() {
        let reply = router().route(&parse(Some("<@U1> pign"), "U1"), &request()).await;

        assert!(reply.text.contains("Command \"pign\" not found."));
        assert!(reply.text.contains("• `ping`"));
    }

    #[tokio::test]
    async fn empty_command_routes_to_help() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = router();
        router.register(CommandName::Help, Echo { calls: calls.clone() });

        let reply = router.route(&ParsedCommand::default(), &request()).await;

        assert_eq!(reply.text, "help:");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn catalogued_command_without_handler_is_coming_soon() {
        let reply = router().route(&parse(Some("weather London"), "U1"), &request()).await;

        assert!(reply.text.starts_with("ℹ️ `weather`"));
        assert!(reply.text.contains("coming soon"));
    }

    #[tokio::test]
    async fn handler_error_becomes_chat_error() {
        let mut router = router();
        router.register(CommandName::Status, Failing);

        let reply = router.route(&parse(Some("status"), "U1"), &request()).await;

        assert!(reply.text.starts_with("❌ Sorry, something went wrong while running `status`"));
        assert!(!reply.text.contains("database"));
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let mut router = router();
        router.register(CommandName::Info, Panicking);

        let reply = router.route(&parse(Some("info"), "U1"), &request()).await;

        assert!(reply.text.starts_with("❌"));
    }

    #[tokio::test]
    async fn rate_limited_request_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router =
            CommandRouter::new(Arc::new(InMemoryRateLimiter::new(AppConfig::default().rate_limit)));
        router.register(CommandName::Ask, Echo { calls: calls.clone() });

        let first = router.route(&parse(Some("ask one"), "U1"), &request()).await;
        let second = router.route(&parse(Some("ask two"), "U1"), &request()).await;

        assert_eq!(first.text, "ask:one");
        assert!(second.text.starts_with("⚠️ Please wait"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
