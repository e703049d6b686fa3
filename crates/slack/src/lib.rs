//! Slack Events API webhook handling for the Info Hub bot
//!
//! - **Signing** (`signature`) - `X-Slack-Signature` verification
//! - **Payloads** (`events`) - handshake / event callback classification
//! - **Commands** (`catalog`, `commands`, `handlers`) - mention parsing and routing
//! - **Replies** (`replies`) - chat text formatting
//! - **Outbound** (`client`) - `chat.postMessage`
//!
//! # Request flow
//!
//! ```text
//! POST /slack → verify → classify → dedup → parse → rate limit → handler
//!                                                   ↓
//!                               ack 200 ← post_message(reply)
//! ```
//!
//! `WebhookDispatcher` owns that flow and is independent of the HTTP framework.

pub mod catalog;
pub mod client;
pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod handlers;
pub mod replies;
pub mod signature;

pub use client::{MessagingClient, SendError, SlackWebClient};
pub use commands::{parse, CommandHandler, CommandRouter, HandlerError, ParsedCommand};
pub use dispatcher::{
    DispatcherSettings, ResponseBody, WebhookDispatcher, WebhookRequest, WebhookResponse,
};
pub use events::{InboundEvent, SlackPayload};
pub use handlers::{default_router, ProcessStart};
pub use replies::ReplyPayload;
pub use signature::AuthError;
