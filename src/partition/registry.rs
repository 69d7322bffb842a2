//! Partition registry
//!
//! Discovers partitions from the store and caches the result for a
//! configured window. Enumeration failures fail closed: callers get the
//! empty set and the next call retries.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::Partition;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::store::PartitionStore;

struct Snapshot {
    partitions: Arc<Vec<Partition>>,
    fetched_at: Instant,
    refreshed_at: DateTime<Utc>,
}

/// Cached view of the store's partitions, ordered by name
pub struct PartitionRegistry<S> {
    store: Arc<S>,
    ttl: Duration,
    list_timeout: Duration,
    reserved: BTreeSet<String>,
    metrics: Arc<MetricsRegistry>,
    cache: RwLock<Option<Snapshot>>,
}

impl<S: PartitionStore> PartitionRegistry<S> {
    pub fn new(store: Arc<S>, ttl: Duration, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            store,
            ttl,
            list_timeout: Duration::from_secs(5),
            reserved: BTreeSet::new(),
            metrics,
            cache: RwLock::new(None),
        }
    }

    /// Collection names that are never partitions
    pub fn with_reserved<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.reserved = names.into_iter().map(Into::into).collect();
        self
    }

    /// Bound on a single enumeration call
    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = timeout;
        self
    }

    /// Current partitions, re-discovered when the cached set is older than
    /// the TTL.
    pub async fn list(&self) -> Arc<Vec<Partition>> {
        {
            let cache = self.cache.read().await;
            if let Some(snapshot) = cache.as_ref().filter(|s| self.is_fresh(s)) {
                return Arc::clone(&snapshot.partitions);
            }
        }

        let mut cache = self.cache.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(snapshot) = cache.as_ref().filter(|s| self.is_fresh(s)) {
            return Arc::clone(&snapshot.partitions);
        }
        self.rediscover(&mut cache).await
    }

    /// Re-discovers immediately, regardless of cache age
    pub async fn refresh(&self) -> Arc<Vec<Partition>> {
        let mut cache = self.cache.write().await;
        self.rediscover(&mut cache).await
    }

    /// Wall-clock time of the last successful discovery
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.as_ref().map(|s| s.refreshed_at)
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        snapshot.fetched_at.elapsed() < self.ttl
    }

    async fn rediscover(&self, cache: &mut Option<Snapshot>) -> Arc<Vec<Partition>> {
        match self.discover().await {
            Some(partitions) => {
                let partitions = Arc::new(partitions);
                *cache = Some(Snapshot {
                    partitions: Arc::clone(&partitions),
                    fetched_at: Instant::now(),
                    refreshed_at: Utc::now(),
                });
                partitions
            }
            None => {
                *cache = None;
                Arc::new(Vec::new())
            }
        }
    }

    async fn discover(&self) -> Option<Vec<Partition>> {
        let listed = match tokio::time::timeout(self.list_timeout, self.store.list_partitions()).await
        {
            Ok(Ok(listed)) => listed,
            Ok(Err(err)) => {
                self.refresh_failed(&err.to_string());
                return None;
            }
            Err(_) => {
                self.refresh_failed("partition enumeration timed out");
                return None;
            }
        };

        let mut partitions = BTreeMap::new();
        for descriptor in listed {
            // Store calls use the raw name; only classification trims.
            let name = descriptor.name;
            let trimmed = name.trim();
            if trimmed.is_empty() || self.reserved.contains(trimmed) {
                continue;
            }
            let (partition, defaulted) = Partition::discover(&name, descriptor.schema_hint.as_deref());
            if defaulted {
                log_event_with_fields(
                    Event::PartitionTagDefaulted,
                    &[("partition", &name), ("schema_tag", partition.schema_tag.as_str())],
                );
            }
            partitions.insert(name, partition);
        }

        self.metrics.increment_registry_refreshes();
        let count = partitions.len().to_string();
        log_event_with_fields(Event::RegistryRefreshed, &[("partitions", &count)]);
        Some(partitions.into_values().collect())
    }

    fn refresh_failed(&self, reason: &str) {
        self.metrics.increment_registry_refresh_failures();
        log_event_with_fields(Event::RegistryRefreshFailed, &[("reason", reason)]);
    }
}
