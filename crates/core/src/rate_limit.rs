//! Per-user request throttling
//!
//! Each `(user, bucket)` pair keeps the timestamps of its recent requests.
//! A request is denied when it arrives inside the bucket's cooldown since the
//! previous request, or when the sliding window already holds `max_requests`.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::config::{BucketLimits, RateLimitConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateBucket {
    Ai,
    Basic,
}

impl RateBucket {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ai => "ai commands",
            Self::Basic => "basic commands",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after_secs: u64, reason: DenialReason },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenialReason {
    Cooldown,
    WindowExhausted { bucket: RateBucket, max_requests: u32 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Chat-facing explanation for a denial; `None` when allowed.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Allowed => None,
            Self::Denied { retry_after_secs, reason: DenialReason::Cooldown } => Some(format!(
                "Please wait {retry_after_secs} seconds before making another request."
            )),
            Self::Denied {
                retry_after_secs,
                reason: DenialReason::WindowExhausted { bucket, max_requests },
            } => Some(format!(
                "Rate limit exceeded. You can make {max_requests} {} per minute. Try again in {retry_after_secs} seconds.",
                bucket.label()
            )),
        }
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, user_id: &str, bucket: RateBucket) -> RateDecision;

    /// Forgets idle history; returns the number of entries dropped.
    async fn sweep(&self, now: Instant) -> usize;
}

/// Limiter that never denies. Used where throttling is disabled.
#[derive(Default)]
pub struct UnlimitedRateLimiter;

#[async_trait]
impl RateLimiter for UnlimitedRateLimiter {
    async fn check(&self, _user_id: &str, _bucket: RateBucket) -> RateDecision {
        RateDecision::Allowed
    }

    async fn sweep(&self, _now: Instant) -> usize {
        0
    }
}

pub struct InMemoryRateLimiter {
    limits: RateLimitConfig,
    history: Mutex<HashMap<(String, RateBucket), Vec<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self { limits, history: Mutex::new(HashMap::new()) }
    }

    fn limits_for(&self, bucket: RateBucket) -> BucketLimits {
        match bucket {
            RateBucket::Ai => self.limits.ai,
            RateBucket::Basic => self.limits.basic,
        }
    }

    /// History older than twice the longest window is never consulted again.
    fn retention(&self) -> Duration {
        self.limits.ai.window().max(self.limits.basic.window()) * 2
    }

    pub fn check_at(&self, user_id: &str, bucket: RateBucket, now: Instant) -> RateDecision {
        let limits = self.limits_for(bucket);
        let window = limits.window();
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let requests = history.entry((user_id.to_owned(), bucket)).or_default();
        requests.retain(|at| now.saturating_duration_since(*at) < window);

        if let Some(last) = requests.iter().max() {
            let since_last = now.saturating_duration_since(*last);
            if since_last < limits.cooldown() {
                let retry_after_secs = ceil_secs(limits.cooldown() - since_last);
                debug!(user_id, ?bucket, retry_after_secs, "rate limiter cooldown active");
                return RateDecision::Denied { retry_after_secs, reason: DenialReason::Cooldown };
            }
        }

        if requests.len() >= limits.max_requests as usize {
            let oldest = requests.iter().min().copied().unwrap_or(now);
            let retry_after_secs =
                ceil_secs((oldest + window).saturating_duration_since(now));
            debug!(user_id, ?bucket, retry_after_secs, "rate limiter window exhausted");
            return RateDecision::Denied {
                retry_after_secs,
                reason: DenialReason::WindowExhausted {
                    bucket,
                    max_requests: limits.max_requests,
                },
            };
        }

        requests.push(now);
        RateDecision::Allowed
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let retention = self.retention();
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        for requests in history.values_mut() {
            requests.retain(|at| now.saturating_duration_since(*at) < retention);
        }
        let before = history.len();
        history.retain(|_, requests| !requests.is_empty());
        before - history.len()
    }

    pub fn tracked_users(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, user_id: &str, bucket: RateBucket) -> RateDecision {
        self.check_at(user_id, bucket, Instant::now())
    }

    async fn sweep(&self, now: Instant) -> usize {
        self.sweep_at(now)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let millis = duration.as_millis() as u64;
    millis.div_ceil(1000).max(1)
}
