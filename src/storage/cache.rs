//! TTL snapshot cache in front of a record store
//!
//! Snapshots are cached per [`Scope`] for a short time-to-live. An insert
//! through the same [`CachedRecordStore`] clears every cached snapshot, so a
//! session sees its own writes immediately. Writes made through another
//! instance or process become visible once the TTL has elapsed; until then a
//! reader may see a snapshot up to `ttl` old.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::Result;
use crate::storage::RecordStore;
use crate::types::{NewRecord, QualityRecord, RecordId, Scope};

/// Cached snapshot
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    /// The cached records, newest first
    pub records: Arc<Vec<QualityRecord>>,

    /// When this was cached
    pub cached_at: Instant,
}

impl CachedSnapshot {
    pub fn new(records: Vec<QualityRecord>) -> Self {
        Self {
            records: Arc::new(records),
            cached_at: Instant::now(),
        }
    }

    /// Check if this snapshot is still valid given TTL
    pub fn is_valid(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Record store wrapper with a per-scope TTL cache
pub struct CachedRecordStore<S> {
    inner: S,
    cache: RwLock<LruCache<Scope, CachedSnapshot>>,
    ttl: Duration,
    counters: RwLock<(u64, u64)>,
}

impl<S: RecordStore> CachedRecordStore<S> {
    pub fn new(inner: S, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: RwLock::new(LruCache::new(capacity)),
            ttl,
            counters: RwLock::new((0, 0)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot for `scope`, served from cache while fresh
    pub async fn snapshot(&self, scope: &Scope) -> Result<Arc<Vec<QualityRecord>>> {
        if let Some(hit) = self.lookup(scope) {
            return Ok(hit);
        }

        let records = self.inner.load_scope(scope).await?;
        let snapshot = CachedSnapshot::new(records);
        let records = snapshot.records.clone();

        if let Ok(mut cache) = self.cache.write() {
            cache.put(scope.clone(), snapshot);
        }
        debug!("Cached snapshot for {} ({} records)", scope, records.len());

        Ok(records)
    }

    fn lookup(&self, scope: &Scope) -> Option<Arc<Vec<QualityRecord>>> {
        let hit = {
            let mut cache = self.cache.write().ok()?;
            cache
                .get(scope)
                .filter(|snapshot| snapshot.is_valid(self.ttl))
                .map(|snapshot| snapshot.records.clone())
        };

        if let Ok(mut counters) = self.counters.write() {
            match hit {
                Some(_) => counters.0 += 1,
                None => counters.1 += 1,
            }
        }
        hit
    }

    /// Drop all cached snapshots
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (size, capacity) = self
            .cache
            .read()
            .map(|cache| (cache.len(), cache.cap().get()))
            .unwrap_or((0, 0));
        let (hits, misses) = self.counters.read().map(|c| *c).unwrap_or((0, 0));

        CacheStats {
            size,
            capacity,
            hits,
            misses,
        }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for CachedRecordStore<S> {
    async fn insert(&self, record: NewRecord) -> Result<RecordId> {
        let id = self.inner.insert(record).await?;
        self.invalidate();
        Ok(id)
    }

    async fn get(&self, id: RecordId) -> Result<Option<QualityRecord>> {
        self.inner.get(id).await
    }

    async fn load_all(&self) -> Result<Vec<QualityRecord>> {
        Ok(self.snapshot(&Scope::Network).await?.as_ref().clone())
    }

    async fn load_scope(&self, scope: &Scope) -> Result<Vec<QualityRecord>> {
        Ok(self.snapshot(scope).await?.as_ref().clone())
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::{create_test_store, sample_record};

    #[tokio::test]
    async fn test_second_read_is_a_hit() {
        let (store, _dir) = create_test_store().await;
        let cached = CachedRecordStore::new(store, 4, Duration::from_secs(60));

        cached.insert(sample_record("Haifa", "Dana", "Pad Thai", 8)).await.unwrap();
        assert_eq!(cached.load_all().await.unwrap().len(), 1);
        assert_eq!(cached.load_all().await.unwrap().len(), 1);

        let stats = cached.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_local_insert_invalidates() {
        let (store, _dir) = create_test_store().await;
        let cached = CachedRecordStore::new(store, 4, Duration::from_secs(60));

        assert!(cached.load_all().await.unwrap().is_empty());
        cached.insert(sample_record("Haifa", "Dana", "Pad Thai", 8)).await.unwrap();
        assert_eq!(cached.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scopes_cached_separately() {
        let (store, _dir) = create_test_store().await;
        let cached = CachedRecordStore::new(store, 4, Duration::from_secs(60));

        cached.insert(sample_record("Haifa", "Dana", "Pad Thai", 8)).await.unwrap();
        cached.insert(sample_record("Savyon", "Omer", "Pad Thai", 4)).await.unwrap();

        let haifa = cached.load_scope(&Scope::Branch("Haifa".into())).await.unwrap();
        let network = cached.load_scope(&Scope::Network).await.unwrap();
        assert_eq!(haifa.len(), 1);
        assert_eq!(network.len(), 2);
        assert_eq!(cached.stats().size, 2);
    }

    #[test]
    fn test_snapshot_expiry() {
        let snapshot = CachedSnapshot::new(vec![]);
        assert!(snapshot.is_valid(Duration::from_secs(15)));
        assert!(!snapshot.is_valid(Duration::ZERO));
    }
}
