//! Verify, classify, deduplicate and dispatch one webhook request.
//!
//! The dispatcher is transport-agnostic: the HTTP layer hands it the method,
//! the two signing headers and the raw body, and renders the returned
//! [`WebhookResponse`]. Exactly one response is produced for every request.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use infohub_core::config::SlackConfig;
use infohub_core::{DispatchMode, IngressError, ReceiptStore};
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::MessagingClient;
use crate::commands::{self, CommandRouter, RequestContext};
use crate::events::{self, EventDisposition, InboundEvent, SlackPayload};
use crate::signature;

pub const ALIVE_TEXT: &str = "👍 Alive";
pub const ACK_TEXT: &str = "OK";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl WebhookResponse {
    pub fn ack() -> Self {
        Self { status: 200, body: ResponseBody::Text(ACK_TEXT.to_owned()) }
    }

    pub fn alive() -> Self {
        Self { status: 200, body: ResponseBody::Text(ALIVE_TEXT.to_owned()) }
    }

    pub fn challenge(challenge: Value) -> Self {
        Self { status: 200, body: ResponseBody::Json(json!({ "challenge": challenge })) }
    }

    pub fn rejected(error: &IngressError) -> Self {
        Self {
            status: error.status_code(),
            body: ResponseBody::Json(json!({ "error": error.public_message() })),
        }
    }
}

/// The parts of an HTTP request the dispatcher needs.
#[derive(Clone, Copy, Debug)]
pub struct WebhookRequest<'a> {
    pub method: &'a str,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub body: &'a [u8],
}

#[derive(Clone, Debug)]
pub struct DispatcherSettings {
    pub signing_secret: SecretString,
    pub bot_user_id: Option<String>,
    pub handshake_bypass: bool,
    pub lenient_unsupported: bool,
    pub dispatch_mode: DispatchMode,
}

impl DispatcherSettings {
    pub fn from_config(config: &SlackConfig) -> Self {
        Self {
            signing_secret: config.signing_secret.clone(),
            bot_user_id: config.bot_user_id.clone(),
            handshake_bypass: config.handshake_bypass,
            lenient_unsupported: config.lenient_unsupported,
            dispatch_mode: config.dispatch_mode,
        }
    }
}

pub struct WebhookDispatcher {
    settings: DispatcherSettings,
    receipts: Arc<dyn ReceiptStore>,
    router: Arc<CommandRouter>,
    messenger: Arc<dyn MessagingClient>,
}

impl WebhookDispatcher {
    pub fn new(
        settings: DispatcherSettings,
        receipts: Arc<dyn ReceiptStore>,
        router: Arc<CommandRouter>,
        messenger: Arc<dyn MessagingClient>,
    ) -> Self {
        Self { settings, receipts, router, messenger }
    }

    pub async fn handle(&self, request: WebhookRequest<'_>) -> WebhookResponse {
        self.handle_at(request, Utc::now().timestamp()).await
    }

    /// `now` is unix seconds, used for the signature freshness window.
    pub async fn handle_at(&self, request: WebhookRequest<'_>, now: i64) -> WebhookResponse {
        match request.method.to_ascii_uppercase().as_str() {
            "GET" => return WebhookResponse::alive(),
            "POST" => {}
            other => {
                return WebhookResponse::rejected(&IngressError::MethodNotAllowed(other.to_owned()))
            }
        }

        debug!(
            event_name = "ingress.slack.request_received",
            body_bytes = request.body.len(),
            "webhook request received"
        );

        if let Err(auth_error) = signature::verify(
            request.body,
            request.timestamp,
            request.signature,
            &self.settings.signing_secret,
            now,
        ) {
            if self.settings.handshake_bypass {
                if let Ok(SlackPayload::Handshake { challenge }) = events::classify(request.body) {
                    warn!(
                        event_name = "ingress.slack.handshake_unverified",
                        error = %auth_error,
                        "answering url verification without a valid signature"
                    );
                    return WebhookResponse::challenge(challenge);
                }
            }
            warn!(
                event_name = "ingress.slack.auth_failed",
                error = %auth_error,
                "rejecting unsigned webhook request"
            );
            return WebhookResponse::rejected(&IngressError::Auth(auth_error.to_string()));
        }

        let payload = match events::classify(request.body) {
            Ok(payload) => payload,
            Err(parse_error) => {
                warn!(
                    event_name = "ingress.slack.parse_failed",
                    error = %parse_error,
                    "webhook body is not valid json"
                );
                return WebhookResponse::rejected(&parse_error);
            }
        };
        debug!(
            event_name = "ingress.slack.classified",
            payload_type = payload.payload_type(),
            "webhook payload classified"
        );

        match payload {
            SlackPayload::Handshake { challenge } => {
                info!(event_name = "ingress.slack.url_verification", "answering url verification");
                WebhookResponse::challenge(challenge)
            }
            SlackPayload::Unsupported { payload_type } => {
                info!(
                    event_name = "ingress.slack.unsupported_payload",
                    payload_type = %payload_type,
                    lenient = self.settings.lenient_unsupported,
                    "unsupported payload type"
                );
                if self.settings.lenient_unsupported {
                    WebhookResponse::ack()
                } else {
                    WebhookResponse::rejected(&IngressError::Unsupported { payload_type })
                }
            }
            SlackPayload::EventCallback(event) => {
                self.accept_event(event).await;
                WebhookResponse::ack()
            }
        }
    }

    async fn accept_event(&self, event: InboundEvent) {
        let correlation_id =
            event.event_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let received_at = Instant::now();

        if !self.receipts.claim(&event.delivery_key(), received_at).await {
            info!(
                event_name = "ingress.slack.duplicate_delivery",
                correlation_id = %correlation_id,
                delivery_key = %event.delivery_key(),
                "duplicate delivery acknowledged without dispatch"
            );
            return;
        }

        let bot_user_id = event.bot_user_id.clone().or_else(|| self.settings.bot_user_id.clone());
        match event.disposition(bot_user_id.as_deref()) {
            EventDisposition::Command => {}
            skipped => {
                debug!(
                    event_name = "ingress.slack.event_skipped",
                    correlation_id = %correlation_id,
                    event_type = %event.event_type,
                    disposition = ?skipped,
                    "event not routed"
                );
                return;
            }
        }

        let work = reply_to_event(
            self.router.clone(),
            self.messenger.clone(),
            event,
            bot_user_id.unwrap_or_default(),
            RequestContextSeed { correlation_id, received_at },
        );

        match self.settings.dispatch_mode {
            DispatchMode::Background => {
                tokio::spawn(work);
            }
            DispatchMode::Inline => work.await,
        }
    }
}

struct RequestContextSeed {
    correlation_id: String,
    received_at: Instant,
}

async fn reply_to_event(
    router: Arc<CommandRouter>,
    messenger: Arc<dyn MessagingClient>,
    event: InboundEvent,
    bot_user_id: String,
    seed: RequestContextSeed,
) {
    let parsed = commands::parse(event.text.as_deref(), &bot_user_id);
    info!(
        event_name = "command.received",
        correlation_id = %seed.correlation_id,
        command = parsed.name.as_deref().unwrap_or("help"),
        user_id = %event.user_id,
        channel = %event.channel,
        "dispatching command"
    );

    let request = RequestContext {
        user_id: event.user_id.clone(),
        channel: event.channel.clone(),
        correlation_id: seed.correlation_id.clone(),
        received_at: seed.received_at,
    };
    let reply = router.route(&parsed, &request).await;

    match messenger.post_message(&event.channel, &event.thread_ts, &reply.text).await {
        Ok(()) => debug!(
            event_name = "egress.slack.posted",
            correlation_id = %seed.correlation_id,
            elapsed_ms = seed.received_at.elapsed().as_millis() as u64,
            "reply posted"
        ),
        Err(send_error) => error!(
            event_name = "egress.slack.post_failed",
            correlation_id = %seed.correlation_id,
            channel = %event.channel,
            error = %send_error,
            "failed to post reply"
        ),
    }
}
