use std::sync::Arc;

use infohub_agent::{AgentRuntime, CompletionCapability, GuardrailPolicy};
use infohub_core::config::{AppConfig, ConfigError};
use infohub_core::{InMemoryRateLimiter, InMemoryReceiptStore};
use infohub_slack::{
    default_router, DispatcherSettings, ProcessStart, SlackWebClient, WebhookDispatcher,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub dispatcher: Arc<WebhookDispatcher>,
    pub receipts: Arc<InMemoryReceiptStore>,
    pub rate_limiter: Arc<InMemoryRateLimiter>,
    pub completion_available: bool,
    pub started: ProcessStart,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Wires every capability from a loaded config. The config is validated
/// again so programmatically built configs get the same checks.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let started = ProcessStart::now();
    let completion = CompletionCapability::from_config(&config.llm);
    let completion_available = completion.is_available();
    let assistant = Arc::new(AgentRuntime::new(completion, GuardrailPolicy::default()));

    let rate_limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()));
    let receipts = Arc::new(InMemoryReceiptStore::new(config.dedup.retention()));
    let messenger = Arc::new(SlackWebClient::new(
        config.slack.bot_token.clone(),
        config.slack.api_base_url.clone(),
        config.slack.request_timeout(),
    ));
    let router = Arc::new(default_router(assistant, rate_limiter.clone(), started));

    let dispatcher = Arc::new(WebhookDispatcher::new(
        DispatcherSettings::from_config(&config.slack),
        receipts.clone(),
        router,
        messenger,
    ));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        completion_available,
        dispatch_mode = ?config.slack.dispatch_mode,
        handshake_bypass = config.slack.handshake_bypass,
        "application capabilities wired"
    );

    Ok(Application { config, dispatcher, receipts, rate_limiter, completion_available, started })
}
