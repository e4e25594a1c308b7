//! In-Memory Broker
//!
//! Process-local implementation of the broker operations, backed by tokio
//! broadcast channels for pub/sub and deadline-tracked maps for sets and
//! hashes. Expired entries are pruned lazily on access, the same way a
//! single-node Redis would reap them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

use super::{Broker, BrokerError, Subscription};

/// Configuration for the in-memory broker
#[derive(Debug, Clone)]
pub struct MemoryBrokerConfig {
    /// Capacity of each per-topic broadcast queue. A subscriber that falls
    /// more than this many payloads behind starts losing the oldest ones.
    pub channel_capacity: usize,
}

impl Default for MemoryBrokerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Set member bookkeeping: member → optional expiry deadline
type MemberDeadlines = HashMap<String, Option<Instant>>;

/// Hash entry: fields plus an optional whole-key expiry deadline
struct HashEntry {
    fields: HashMap<String, String>,
    deadline: Option<Instant>,
}

impl HashEntry {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Shared in-process key-value and pub/sub store
pub struct MemoryBroker {
    sets: RwLock<HashMap<String, MemberDeadlines>>,
    hashes: RwLock<HashMap<String, HashEntry>>,
    topics: RwLock<HashMap<String, broadcast::Sender<String>>>,
    config: MemoryBrokerConfig,
}

impl MemoryBroker {
    /// Create a broker with the given configuration
    pub fn new(config: MemoryBrokerConfig) -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
            hashes: RwLock::new(HashMap::new()),
            topics: RwLock::new(HashMap::new()),
            config,
        }
    }

    fn member_live(deadline: &Option<Instant>) -> bool {
        match deadline {
            Some(d) => Instant::now() < *d,
            None => true,
        }
    }

    /// Drop expired members from one set in place
    fn prune_set(members: &mut MemberDeadlines) {
        members.retain(|_, deadline| Self::member_live(deadline));
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(MemoryBrokerConfig::default())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn set_add(
        &self,
        key: &str,
        member: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, BrokerError> {
        let mut sets = self.sets.write().await;
        let members = sets.entry(key.to_string()).or_default();
        Self::prune_set(members);

        if members.contains_key(member) {
            return Ok(false);
        }

        let deadline = ttl.map(|t| Instant::now() + t);
        members.insert(member.to_string(), deadline);
        Ok(true)
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, BrokerError> {
        let sets = self.sets.read().await;
        let live = sets
            .get(key)
            .and_then(|members| members.get(member))
            .map(Self::member_live)
            .unwrap_or(false);
        Ok(live)
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, BrokerError> {
        let mut sets = self.sets.write().await;
        let Some(members) = sets.get_mut(key) else {
            return Ok(false);
        };

        let was_live = members
            .remove(member)
            .map(|deadline| Self::member_live(&deadline))
            .unwrap_or(false);

        // Clean up empty set entries
        if members.is_empty() {
            sets.remove(key);
        }
        Ok(was_live)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), BrokerError> {
        let mut hashes = self.hashes.write().await;
        let entry = hashes.entry(key.to_string()).or_insert_with(|| HashEntry {
            fields: HashMap::new(),
            deadline: None,
        });

        // Writing to an expired key starts a fresh entry, like SET after TTL
        if entry.expired() {
            entry.fields.clear();
            entry.deadline = None;
        }

        entry.fields.insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, BrokerError> {
        let hashes = self.hashes.read().await;
        let fields = hashes
            .get(key)
            .filter(|entry| !entry.expired())
            .map(|entry| entry.fields.clone())
            .unwrap_or_default();
        Ok(fields)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), BrokerError> {
        let mut hashes = self.hashes.write().await;
        if let Some(entry) = hashes.get_mut(key) {
            if !entry.expired() {
                entry.deadline = Some(Instant::now() + ttl);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BrokerError> {
        self.hashes.write().await.remove(key);
        self.sets.write().await.remove(key);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<usize, BrokerError> {
        let topics = self.topics.read().await;
        let delivered = match topics.get(topic) {
            // send only fails when no receiver is attached; that is a
            // delivery count of zero, not a broker failure
            Some(tx) => tx.send(payload.to_string()).unwrap_or(0),
            None => 0,
        };

        tracing::trace!(topic = %topic, delivered = delivered, "Published payload");
        Ok(delivered)
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
        let mut topics = self.topics.write().await;
        let tx = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0);

        tracing::debug!(topic = %topic, "Subscription opened");
        Ok(Subscription::new(tx.subscribe()))
    }

    async fn subscriber_count(&self, topic: &str) -> Result<usize, BrokerError> {
        let topics = self.topics.read().await;
        Ok(topics.get(topic).map(|tx| tx.receiver_count()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::SubscriptionError;

    #[tokio::test]
    async fn test_set_add_is_conditional() {
        let broker = MemoryBroker::default();

        assert!(broker.set_add("users", "alice", None).await.unwrap());
        assert!(!broker.set_add("users", "alice", None).await.unwrap());
        assert!(broker.set_contains("users", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_remove() {
        let broker = MemoryBroker::default();

        broker.set_add("users", "alice", None).await.unwrap();
        assert!(broker.set_remove("users", "alice").await.unwrap());
        assert!(!broker.set_remove("users", "alice").await.unwrap());
        assert!(!broker.set_contains("users", "alice").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_member_ttl_expires() {
        let broker = MemoryBroker::default();
        let ttl = Duration::from_secs(60);

        broker.set_add("users", "alice", Some(ttl)).await.unwrap();
        assert!(broker.set_contains("users", "alice").await.unwrap());

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(!broker.set_contains("users", "alice").await.unwrap());
        // The slot is free to claim again
        assert!(broker.set_add("users", "alice", Some(ttl)).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_set_get_all() {
        let broker = MemoryBroker::default();

        broker.hash_set("session:1", "nickname", "bob").await.unwrap();
        broker
            .hash_set("session:1", "connectedAt", "2024-01-01T00:00:00Z")
            .await
            .unwrap();

        let fields = broker.hash_get_all("session:1").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("nickname").map(String::as_str), Some("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hash_key_expiry() {
        let broker = MemoryBroker::default();

        broker.hash_set("session:1", "nickname", "bob").await.unwrap();
        broker
            .expire("session:1", Duration::from_secs(30))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;

        let fields = broker.hash_get_all("session:1").await.unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let broker = MemoryBroker::default();

        broker.hash_set("session:1", "nickname", "bob").await.unwrap();
        broker.delete("session:1").await.unwrap();
        broker.delete("session:1").await.unwrap();

        assert!(broker.hash_get_all("session:1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_reaches_live_subscribers() {
        let broker = MemoryBroker::default();

        let mut sub = broker.subscribe("messageAdded").await.unwrap();
        let delivered = broker.publish("messageAdded", "hello").await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(sub.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_accepted() {
        let broker = MemoryBroker::default();

        let delivered = broker.publish("messageAdded", "hello").await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_no_backfill_for_late_subscribers() {
        let broker = MemoryBroker::default();

        broker.publish("messageAdded", "early").await.unwrap();
        let mut sub = broker.subscribe("messageAdded").await.unwrap();
        broker.publish("messageAdded", "late").await.unwrap();

        assert_eq!(sub.recv().await.unwrap(), "late");
    }

    #[tokio::test]
    async fn test_delivery_order_matches_publish_order() {
        let broker = MemoryBroker::default();

        let mut sub = broker.subscribe("messageAdded").await.unwrap();
        for payload in ["m1", "m2", "m3"] {
            broker.publish("messageAdded", payload).await.unwrap();
        }

        assert_eq!(sub.recv().await.unwrap(), "m1");
        assert_eq!(sub.recv().await.unwrap(), "m2");
        assert_eq!(sub.recv().await.unwrap(), "m3");
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_oldest() {
        let broker = MemoryBroker::new(MemoryBrokerConfig {
            channel_capacity: 2,
        });

        let mut sub = broker.subscribe("messageAdded").await.unwrap();
        for payload in ["m1", "m2", "m3"] {
            broker.publish("messageAdded", payload).await.unwrap();
        }

        match sub.recv().await {
            Err(SubscriptionError::Lagged(missed)) => assert_eq!(missed, 1),
            other => panic!("Expected lag, got {:?}", other.map(|_| ())),
        }
        // The subscription stays usable after the lag report
        assert_eq!(sub.recv().await.unwrap(), "m2");
        assert_eq!(sub.recv().await.unwrap(), "m3");
    }

    #[tokio::test]
    async fn test_dropped_subscription_releases_slot() {
        let broker = MemoryBroker::default();

        let sub = broker.subscribe("messageAdded").await.unwrap();
        assert_eq!(broker.subscriber_count("messageAdded").await.unwrap(), 1);

        drop(sub);
        assert_eq!(broker.subscriber_count("messageAdded").await.unwrap(), 0);

        // Publishing into the drained topic still succeeds
        let delivered = broker.publish("messageAdded", "hello").await.unwrap();
        assert_eq!(delivered, 0);
    }
}
