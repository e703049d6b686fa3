//! Outbound chat capability and its Slack Web API implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("slack transport error: {0}")]
    Transport(String),
    #[error("slack did not answer in time")]
    Timeout,
    #[error("slack returned http {0}")]
    Status(u16),
    #[error("slack api error: {0}")]
    Api(String),
}

#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn post_message(&self, channel: &str, thread_ts: &str, text: &str)
        -> Result<(), SendError>;
}

/// `chat.postMessage` over HTTPS with the bot token.
pub struct SlackWebClient {
    http: Client,
    bot_token: SecretString,
    api_base_url: String,
}

#[derive(Serialize)]
struct PostMessageBody<'a> {
    channel: &'a str,
    thread_ts: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackWebClient {
    pub fn new(bot_token: SecretString, api_base_url: impl Into<String>, timeout: Duration) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { http, bot_token, api_base_url }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }
}

#[async_trait]
impl MessagingClient for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<(), SendError> {
        debug!(channel, thread_ts, "posting thread reply");
        let response = self
            .http
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&PostMessageBody { channel, thread_ts, text })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status(status.as_u16()));
        }

        let body = response
            .json::<SlackApiResponse>()
            .await
            .map_err(transport_error)?;
        if body.ok {
            Ok(())
        } else {
            Err(SendError::Api(body.error.unwrap_or_else(|| "unknown_error".to_owned())))
        }
    }
}

fn transport_error(error: reqwest::Error) -> SendError {
    if error.is_timeout() {
        SendError::Timeout
    } else {
        SendError::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{MessagingClient, SendError, SlackWebClient};

    fn client(server: &MockServer) -> SlackWebClient {
        SlackWebClient::new(
            "xoxb-test".to_owned().into(),
            format!("{}/api/", server.uri()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn posts_threaded_reply_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .and(header("Authorization", "Bearer xoxb-test"))
            .and(body_json(json!({"channel": "C1", "thread_ts": "1.0", "text": "pong"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "ts": "2.0"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).post_message("C1", "1.0", "pong").await.expect("posted");
    }

    #[tokio::test]
    async fn api_level_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let result = client(&server).post_message("C404", "1.0", "hi").await;

        assert_eq!(result, Err(SendError::Api("channel_not_found".to_owned())));
    }

    #[tokio::test]
    async fn http_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client(&server).post_message("C1", "1.0", "hi").await;

        assert_eq!(result, Err(SendError::Status(503)));
    }

    #[tokio::test]
    async fn hung_slack_api_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat.postMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({"ok": true})),
            )
            .mount(&server)
            .await;

        let client = SlackWebClient::new(
            "xoxb-test".to_owned().into(),
            format!("{}/api", server.uri()),
            Duration::from_millis(200),
        );
        let result = client.post_message("C1", "1.0", "hi").await;

        assert_eq!(result, Err(SendError::Timeout));
    }
}
