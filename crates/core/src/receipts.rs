use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Identity of one Slack delivery, used to recognise at-least-once redelivery.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryKey {
    EventId(String),
    Composite { channel: String, user_id: String, ts: String },
}

impl DeliveryKey {
    /// Prefers Slack's `event_id`; falls back to the message coordinates.
    pub fn for_event(event_id: Option<&str>, channel: &str, user_id: &str, ts: &str) -> Self {
        match event_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(event_id) => Self::EventId(event_id.to_owned()),
            None => Self::Composite {
                channel: channel.to_owned(),
                user_id: user_id.to_owned(),
                ts: ts.to_owned(),
            },
        }
    }
}

impl fmt::Display for DeliveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventId(event_id) => f.write_str(event_id),
            Self::Composite { channel, user_id, ts } => write!(f, "{channel}:{user_id}:{ts}"),
        }
    }
}

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Records `key` and returns `true` unless it was already recorded within
    /// the retention window. Check and insert happen under one lock.
    async fn claim(&self, key: &DeliveryKey, now: Instant) -> bool;

    async fn contains(&self, key: &DeliveryKey, now: Instant) -> bool;

    /// Drops expired receipts and returns how many were removed.
    async fn sweep(&self, now: Instant) -> usize;

    async fn len(&self) -> usize;
}

/// Per-process receipt store. Instances do not share state, so a deployment
/// with several replicas can still process a redelivery once per replica.
pub struct InMemoryReceiptStore {
    retention: Duration,
    entries: Mutex<HashMap<DeliveryKey, Instant>>,
}

impl InMemoryReceiptStore {
    pub fn new(retention: Duration) -> Self {
        Self { retention, entries: Mutex::new(HashMap::new()) }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    fn is_live(&self, recorded_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(recorded_at) < self.retention
    }
}

#[async_trait]
impl ReceiptStore for InMemoryReceiptStore {
    async fn claim(&self, key: &DeliveryKey, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(recorded_at) = entries.get(key) {
            if self.is_live(*recorded_at, now) {
                return false;
            }
        }
        entries.insert(key.clone(), now);
        true
    }

    async fn contains(&self, key: &DeliveryKey, now: Instant) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).is_some_and(|recorded_at| self.is_live(*recorded_at, now))
    }

    async fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, recorded_at| self.is_live(*recorded_at, now));
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::{DeliveryKey, InMemoryReceiptStore, ReceiptStore};

    #[test]
    fn key_prefers_event_id_over_coordinates() {
        assert_eq!(
            DeliveryKey::for_event(Some("Ev01"), "C1", "U1", "1.0"),
            DeliveryKey::EventId("Ev01".to_owned())
        );
        assert_eq!(
            DeliveryKey::for_event(Some("  "), "C1", "U1", "1.0").to_string(),
            "C1:U1:1.0"
        );
    }

    #[tokio::test]
    async fn second_claim_within_retention_is_rejected() {
        let store = InMemoryReceiptStore::new(Duration::from_secs(300));
        let key = DeliveryKey::EventId("Ev01".to_owned());
        let now = Instant::now();

        assert!(store.claim(&key, now).await);
        assert!(!store.claim(&key, now + Duration::from_secs(299)).await);
        assert!(store.contains(&key, now + Duration::from_secs(10)).await);
    }

    #[tokio::test]
    async fn claim_succeeds_again_after_retention_expires() {
        let store = InMemoryReceiptStore::new(Duration::from_secs(300));
        let key = DeliveryKey::EventId("Ev02".to_owned());
        let now = Instant::now();

        assert!(store.claim(&key, now).await);
        assert!(!store.contains(&key, now + Duration::from_secs(300)).await);
        assert!(store.claim(&key, now + Duration::from_secs(301)).await);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_receipts() {
        let store = InMemoryReceiptStore::new(Duration::from_secs(60));
        let now = Instant::now();
        store.claim(&DeliveryKey::EventId("old".to_owned()), now).await;
        store.claim(&DeliveryKey::EventId("fresh".to_owned()), now + Duration::from_secs(50)).await;

        let removed = store.sweep(now + Duration::from_secs(70)).await;

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.contains(&DeliveryKey::EventId("fresh".to_owned()), now + Duration::from_secs(70)).await);
    }

    #[tokio::test]
    async fn concurrent_claims_admit_exactly_one() {
        let store = Arc::new(InMemoryReceiptStore::new(Duration::from_secs(300)));
        let key = DeliveryKey::EventId("Ev-race".to_owned());
        let now = Instant::now();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move { store.claim(&key, now).await }));
        }

        let mut admitted = 0;
        for task in tasks {
            if task.await.expect("claim task") {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn separate_instances_do_not_share_receipts() {
        // Known gap: receipts are per-process, so two replicas each accept the same delivery.
        let replica_a = InMemoryReceiptStore::new(Duration::from_secs(300));
        let replica_b = InMemoryReceiptStore::new(Duration::from_secs(300));
        let key = DeliveryKey::EventId("Ev-scaled".to_owned());
        let now = Instant::now();

        assert!(replica_a.claim(&key, now).await);
        assert!(replica_b.claim(&key, now).await);
    }
}
