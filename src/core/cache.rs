use crate::core::fund::MetricsRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Observable state of one metrics key.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsState {
    Absent,
    Pending,
    Present(MetricsRecord),
    Failed(String),
}

impl MetricsState {
    pub fn record(&self) -> Option<&MetricsRecord> {
        match self {
            MetricsState::Present(record) => Some(record),
            _ => None,
        }
    }
}

/// Proof that the holder owns the in-flight fetch for a key. Completing with a
/// stale ticket (e.g. after the session was cleared) is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

enum Entry {
    Pending(FetchTicket),
    Present(MetricsRecord),
    Failed(String),
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_ticket: u64,
    failures: usize,
}

/// Session-scoped metrics cache keyed by tax id. No TTL and no eviction: a
/// present record stays until [`MetricsCache::clear`].
#[derive(Clone, Default)]
pub struct MetricsCache {
    inner: Arc<Mutex<Inner>>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<MetricsRecord> {
        let cache = self.inner.lock().await;
        match cache.entries.get(key) {
            Some(Entry::Present(record)) => {
                debug!("Cache HIT for metrics: {}", key);
                Some(*record)
            }
            _ => {
                debug!("Cache MISS for metrics: {}", key);
                None
            }
        }
    }

    pub async fn state(&self, key: &str) -> MetricsState {
        let cache = self.inner.lock().await;
        state_of(cache.entries.get(key))
    }

    /// Returns the state of every requested key under a single lock.
    pub async fn states<'a, I>(&self, keys: I) -> HashMap<String, MetricsState>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cache = self.inner.lock().await;
        keys.into_iter()
            .map(|key| (key.to_string(), state_of(cache.entries.get(key))))
            .collect()
    }

    /// Marks `key` pending and hands out a ticket, unless the key is already
    /// present or another fetch holds it. Failed keys may be claimed again.
    pub async fn claim(&self, key: &str) -> Option<FetchTicket> {
        let mut cache = self.inner.lock().await;
        match cache.entries.get(key) {
            Some(Entry::Present(_)) => {
                debug!("Metrics already cached for {}", key);
                None
            }
            Some(Entry::Pending(_)) => {
                debug!("Metrics fetch already in flight for {}", key);
                None
            }
            Some(Entry::Failed(_)) | None => {
                cache.next_ticket += 1;
                let ticket = FetchTicket(cache.next_ticket);
                cache.entries.insert(key.to_string(), Entry::Pending(ticket));
                Some(ticket)
            }
        }
    }

    /// Stores the fetched record. Returns false when the ticket no longer owns the key.
    pub async fn complete(&self, key: &str, ticket: FetchTicket, record: MetricsRecord) -> bool {
        let mut cache = self.inner.lock().await;
        match cache.entries.get(key) {
            Some(Entry::Pending(owner)) if *owner == ticket => {
                debug!("Cache PUT for metrics: {}", key);
                cache.entries.insert(key.to_string(), Entry::Present(record));
                true
            }
            _ => false,
        }
    }

    pub async fn fail(&self, key: &str, ticket: FetchTicket, reason: String) -> bool {
        let mut cache = self.inner.lock().await;
        match cache.entries.get(key) {
            Some(Entry::Pending(owner)) if *owner == ticket => {
                cache.entries.insert(key.to_string(), Entry::Failed(reason));
                cache.failures += 1;
                true
            }
            _ => false,
        }
    }

    /// Total failed fetches this session, including ones later retried successfully.
    pub async fn failure_count(&self) -> usize {
        self.inner.lock().await.failures
    }

    pub async fn len(&self) -> usize {
        let cache = self.inner.lock().await;
        cache
            .entries
            .values()
            .filter(|entry| matches!(entry, Entry::Present(_)))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.entries.clear();
        cache.failures = 0;
    }
}

fn state_of(entry: Option<&Entry>) -> MetricsState {
    match entry {
        None => MetricsState::Absent,
        Some(Entry::Pending(_)) => MetricsState::Pending,
        Some(Entry::Present(record)) => MetricsState::Present(*record),
        Some(Entry::Failed(reason)) => MetricsState::Failed(reason.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rentability: f64) -> MetricsRecord {
        MetricsRecord {
            rentability,
            volatility: 0.1,
            sharpe: 1.2,
            observations: None,
        }
    }

    #[tokio::test]
    async fn test_claim_complete_get() {
        let cache = MetricsCache::new();

        // Initially, cache is empty
        assert!(cache.get("A").await.is_none());
        assert_eq!(cache.state("A").await, MetricsState::Absent);

        let ticket = cache.claim("A").await.expect("absent key must be claimable");
        assert_eq!(cache.state("A").await, MetricsState::Pending);

        // Second claim while pending is refused
        assert!(cache.claim("A").await.is_none());

        assert!(cache.complete("A", ticket, record(0.5)).await);
        assert_eq!(cache.get("A").await, Some(record(0.5)));
        assert_eq!(cache.len().await, 1);

        // Present keys are never handed out again
        assert!(cache.claim("A").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_key_can_be_retried() {
        let cache = MetricsCache::new();

        let ticket = cache.claim("B").await.unwrap();
        assert!(cache.fail("B", ticket, "404".to_string()).await);
        assert_eq!(cache.state("B").await, MetricsState::Failed("404".to_string()));
        assert_eq!(cache.failure_count().await, 1);

        let retry = cache.claim("B").await.expect("failed key must be retryable");
        assert_ne!(retry, ticket);
        assert!(cache.complete("B", retry, record(0.2)).await);
        assert_eq!(cache.get("B").await, Some(record(0.2)));
        assert_eq!(cache.failure_count().await, 1);
    }

    #[tokio::test]
    async fn test_stale_ticket_is_ignored() {
        let cache = MetricsCache::new();

        let stale = cache.claim("C").await.unwrap();
        cache.clear().await;
        let fresh = cache.claim("C").await.unwrap();

        assert!(!cache.complete("C", stale, record(9.0)).await);
        assert_eq!(cache.state("C").await, MetricsState::Pending);
        assert!(!cache.fail("C", stale, "late".to_string()).await);

        assert!(cache.complete("C", fresh, record(1.0)).await);
        // A completed key cannot be overwritten by the same ticket either
        assert!(!cache.complete("C", fresh, record(2.0)).await);
        assert_eq!(cache.get("C").await, Some(record(1.0)));
    }

    #[tokio::test]
    async fn test_states_snapshot() {
        let cache = MetricsCache::new();
        let ticket = cache.claim("A").await.unwrap();
        cache.complete("A", ticket, record(0.3)).await;
        cache.claim("B").await.unwrap();

        let states = cache.states(["A", "B", "C"]).await;
        assert_eq!(states["A"], MetricsState::Present(record(0.3)));
        assert_eq!(states["B"], MetricsState::Pending);
        assert_eq!(states["C"], MetricsState::Absent);
    }
}
