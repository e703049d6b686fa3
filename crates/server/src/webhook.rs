use std::error::Error as _;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use http_body_util::LengthLimitError;
use infohub_core::IngressError;
use infohub_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use infohub_slack::{ResponseBody, WebhookDispatcher, WebhookRequest, WebhookResponse};
use tracing::{error, warn};

pub const SLACK_PATH: &str = "/slack";

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<WebhookDispatcher>,
    pub max_body_bytes: usize,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route(SLACK_PATH, any(slack_webhook)).with_state(state)
}

pub async fn slack_webhook(
    State(state): State<WebhookState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let raw_body = if method == Method::POST {
        match read_body(&headers, body, state.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(ingress_error) => {
                warn!(
                    event_name = "ingress.slack.body_rejected",
                    status = ingress_error.status_code(),
                    retryable = ingress_error.is_retryable(),
                    error = %ingress_error,
                    "webhook body rejected before dispatch"
                );
                return render(WebhookResponse::rejected(&ingress_error));
            }
        }
    } else {
        Bytes::new()
    };

    let response = state
        .dispatcher
        .handle(WebhookRequest {
            method: method.as_str(),
            timestamp: header_str(&headers, TIMESTAMP_HEADER),
            signature: header_str(&headers, SIGNATURE_HEADER),
            body: &raw_body,
        })
        .await;
    render(response)
}

/// Reads the whole body before any parsing, bounded by `limit`.
async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, IngressError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > limit) {
        return Err(IngressError::PayloadTooLarge { limit });
    }

    to_bytes(body, limit).await.map_err(|read_error| {
        if read_error.source().is_some_and(|source| source.is::<LengthLimitError>()) {
            return IngressError::PayloadTooLarge { limit };
        }
        error!(
            event_name = "ingress.slack.body_read_failed",
            error = %read_error,
            "failed to read webhook body"
        );
        IngressError::Transport(read_error.to_string())
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn render(response: WebhookResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        ResponseBody::Text(text) => (status, text).into_response(),
        ResponseBody::Json(value) => (status, Json(value)).into_response(),
    }
}
