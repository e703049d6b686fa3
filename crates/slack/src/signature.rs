//! Slack request signing (`X-Slack-Signature` / `X-Slack-Request-Timestamp`).

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

const VERSION: &str = "v0";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("request timestamp is not an integer")]
    MalformedTimestamp,
    #[error("request timestamp is {skew_secs}s away from server time")]
    StaleTimestamp { skew_secs: i64 },
    #[error("signature does not match request body")]
    BadSignature,
}

/// Checks a request against the shared signing secret. `now` is unix seconds.
///
/// Staleness is checked before the MAC so replayed requests are rejected
/// without touching the secret.
pub fn verify(
    raw_body: &[u8],
    timestamp_header: Option<&str>,
    signature_header: Option<&str>,
    signing_secret: &SecretString,
    now: i64,
) -> Result<(), AuthError> {
    let timestamp = timestamp_header.ok_or(AuthError::MissingHeader(TIMESTAMP_HEADER))?.trim();
    let signature = signature_header.ok_or(AuthError::MissingHeader(SIGNATURE_HEADER))?.trim();

    let sent_at = timestamp.parse::<i64>().map_err(|_| AuthError::MalformedTimestamp)?;
    let skew_secs = now.saturating_sub(sent_at).saturating_abs();
    if skew_secs > MAX_CLOCK_SKEW_SECS {
        return Err(AuthError::StaleTimestamp { skew_secs });
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or(AuthError::BadSignature)?;

    mac_for(signing_secret, timestamp, raw_body)?
        .verify_slice(&provided)
        .map_err(|_| AuthError::BadSignature)
}

/// Computes the `X-Slack-Signature` value for a body.
pub fn sign(raw_body: &[u8], timestamp: &str, signing_secret: &SecretString) -> String {
    match mac_for(signing_secret, timestamp, raw_body) {
        Ok(mac) => format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes())),
        Err(_) => format!("{VERSION}="),
    }
}

fn mac_for(
    signing_secret: &SecretString,
    timestamp: &str,
    raw_body: &[u8],
) -> Result<HmacSha256, AuthError> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.expose_secret().as_bytes())
        .map_err(|_| AuthError::BadSignature)?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);
    Ok(mac)
}
