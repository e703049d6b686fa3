use infohub_core::{DeliveryKey, IngressError};
use serde_json::Value;

pub const URL_VERIFICATION: &str = "url_verification";
pub const EVENT_CALLBACK: &str = "event_callback";

/// Outcome of decoding a request body.
#[derive(Clone, Debug, PartialEq)]
pub enum SlackPayload {
    /// One-time handshake; the challenge is echoed back untouched.
    Handshake { challenge: Value },
    EventCallback(InboundEvent),
    Unsupported { payload_type: String },
}

impl SlackPayload {
    pub fn payload_type(&self) -> &str {
        match self {
            Self::Handshake { .. } => URL_VERIFICATION,
            Self::EventCallback(_) => EVENT_CALLBACK,
            Self::Unsupported { payload_type } => payload_type,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundEvent {
    pub event_id: Option<String>,
    pub event_type: String,
    pub subtype: Option<String>,
    pub text: Option<String>,
    pub channel: String,
    pub channel_type: Option<String>,
    pub user_id: String,
    pub ts: String,
    /// Thread to reply into: the message's own `thread_ts`, else its `ts`.
    pub thread_ts: String,
    /// From `authorizations[0].user_id`, when Slack sent it.
    pub bot_user_id: Option<String>,
    pub authored_by_bot: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDisposition {
    Command,
    SkipBotAuthored,
    SkipSelf,
    Ignored,
}

impl InboundEvent {
    pub fn delivery_key(&self) -> DeliveryKey {
        DeliveryKey::for_event(self.event_id.as_deref(), &self.channel, &self.user_id, &self.ts)
    }

    pub fn is_direct_message(&self) -> bool {
        self.event_type == "message"
            && self.channel_type.as_deref() == Some("im")
            && self.subtype.is_none()
    }

    /// Decides whether this event should reach the command router.
    pub fn disposition(&self, bot_user_id: Option<&str>) -> EventDisposition {
        if self.authored_by_bot {
            return EventDisposition::SkipBotAuthored;
        }
        if bot_user_id.is_some_and(|bot| !self.user_id.is_empty() && self.user_id == bot) {
            return EventDisposition::SkipSelf;
        }
        if self.channel.is_empty() {
            return EventDisposition::Ignored;
        }
        if self.event_type == "app_mention" || self.is_direct_message() {
            EventDisposition::Command
        } else {
            EventDisposition::Ignored
        }
    }
}

/// Decodes a raw body. Only a JSON syntax error is a failure; unexpected
/// shapes become `Unsupported` or an event with empty fields.
pub fn classify(raw_body: &[u8]) -> Result<SlackPayload, IngressError> {
    let payload: Value =
        serde_json::from_slice(raw_body).map_err(|error| IngressError::Parse(error.to_string()))?;

    let payload_type = str_field(&payload, "type").unwrap_or_default();
    match payload_type.as_str() {
        URL_VERIFICATION => Ok(SlackPayload::Handshake {
            challenge: payload.get("challenge").cloned().unwrap_or(Value::Null),
        }),
        EVENT_CALLBACK => Ok(SlackPayload::EventCallback(inbound_event(&payload))),
        _ => Ok(SlackPayload::Unsupported { payload_type }),
    }
}

fn inbound_event(payload: &Value) -> InboundEvent {
    let event = payload.get("event").unwrap_or(&Value::Null);
    let ts = str_field(event, "ts").or_else(|| str_field(event, "event_ts")).unwrap_or_default();
    let thread_ts = str_field(event, "thread_ts").unwrap_or_else(|| ts.clone());
    let subtype = str_field(event, "subtype");
    let authored_by_bot =
        str_field(event, "bot_id").is_some() || subtype.as_deref() == Some("bot_message");

    InboundEvent {
        event_id: str_field(payload, "event_id"),
        event_type: str_field(event, "type").unwrap_or_default(),
        subtype,
        text: str_field(event, "text"),
        channel: str_field(event, "channel").unwrap_or_default(),
        channel_type: str_field(event, "channel_type"),
        user_id: str_field(event, "user").unwrap_or_default(),
        ts,
        thread_ts,
        bot_user_id: payload
            .get("authorizations")
            .and_then(|auths| auths.get(0))
            .and_then(|auth| str_field(auth, "user_id")),
        authored_by_bot,
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).filter(|text| !text.is_empty()).map(str::to_owned)
}
