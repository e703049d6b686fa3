use thiserror::Error;

/// Failures that decide the HTTP status of an inbound webhook request.
///
/// Failures after classification (handler errors, outbound send errors) are
/// not represented here; they never change the acknowledgment Slack sees.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IngressError {
    #[error("request body could not be read: {0}")]
    Transport(String),
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("request body is not valid JSON: {0}")]
    Parse(String),
    #[error("request authentication failed: {0}")]
    Auth(String),
    #[error("unsupported payload type `{payload_type}`")]
    Unsupported { payload_type: String },
    #[error("method `{0}` is not allowed")]
    MethodNotAllowed(String),
}

impl IngressError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::PayloadTooLarge { .. } => 413,
            Self::Parse(_) => 400,
            Self::Auth(_) => 401,
            Self::Unsupported { .. } | Self::MethodNotAllowed(_) => 405,
        }
    }

    /// Response body safe to return to the caller; never echoes internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Internal Server Error",
            Self::PayloadTooLarge { .. } => "Payload Too Large",
            Self::Parse(_) => "Invalid JSON",
            Self::Auth(_) => "Unauthorized",
            Self::Unsupported { .. } => "Unsupported payload",
            Self::MethodNotAllowed(_) => "Method Not Allowed",
        }
    }

    /// Slack redelivers any non-2xx answer; only these can succeed on redelivery.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
