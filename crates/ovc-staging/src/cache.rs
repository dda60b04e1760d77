//! Single-entry query result cache.
//!
//! Memoizes the rows of the most recent query so that repeating an
//! identical query (idle polling, double clicks) does not reach the remote
//! boundary again. There is no TTL: freshness is the caller's job, and any
//! checkout/checkin must call [`QueryCache::invalidate`].

use std::sync::Arc;

use ovc_core::{QuerySignature, RawRow};
use tracing::debug;

/// Rows shared between the cache and the staging store.
pub type CachedRows = Arc<Vec<RawRow>>;

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Holds at most one entry; every `put` evicts the previous one.
#[derive(Debug, Default)]
pub struct QueryCache {
    entry: Option<(QuerySignature, CachedRows)>,
    stats: CacheStats,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows cached under exactly `signature`, if any.
    ///
    /// Anything but a byte-equal signature is a miss.
    pub fn get(&mut self, signature: &QuerySignature) -> Option<CachedRows> {
        match &self.entry {
            Some((cached, rows)) if cached == signature => {
                self.stats.hits += 1;
                debug!(query = %signature, rows = rows.len(), "Query cache hit");
                Some(Arc::clone(rows))
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Replace the cached entry.
    pub fn put(&mut self, signature: QuerySignature, rows: CachedRows) {
        self.entry = Some((signature, rows));
    }

    /// Drop the cached entry, if any.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            self.stats.invalidations += 1;
            debug!("Query cache invalidated");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Signature of the cached entry.
    pub fn signature(&self) -> Option<&QuerySignature> {
        self.entry.as_ref().map(|(sig, _)| sig)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(term: &str) -> QuerySignature {
        QuerySignature::new("objects.search").with_param("term", term)
    }

    fn rows(names: &[&str]) -> CachedRows {
        Arc::new(
            names
                .iter()
                .map(|n| RawRow::from([("name".to_string(), n.to_string())]))
                .collect(),
        )
    }

    #[test]
    fn test_get_returns_exact_put() {
        let mut cache = QueryCache::new();
        let stored = rows(&["A", "B"]);
        cache.put(sig("a"), Arc::clone(&stored));

        let hit = cache.get(&sig("a")).unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
    }

    #[test]
    fn test_other_signature_misses() {
        let mut cache = QueryCache::new();
        cache.put(sig("a"), rows(&["A"]));
        assert!(cache.get(&sig("b")).is_none());
        assert!(cache.get(&sig("A")).is_none());
    }

    #[test]
    fn test_put_evicts_previous_entry() {
        let mut cache = QueryCache::new();
        cache.put(sig("a"), rows(&["A"]));
        cache.put(sig("b"), rows(&["B"]));

        assert!(cache.get(&sig("a")).is_none());
        assert_eq!(cache.get(&sig("b")).unwrap().len(), 1);
        assert_eq!(cache.signature(), Some(&sig("b")));
    }

    #[test]
    fn test_invalidate_clears_entry() {
        let mut cache = QueryCache::new();
        cache.put(sig("a"), rows(&["A"]));
        cache.invalidate();
        cache.invalidate();

        assert!(cache.is_empty());
        assert!(cache.get(&sig("a")).is_none());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let mut cache = QueryCache::new();
        cache.get(&sig("a"));
        cache.put(sig("a"), rows(&[]));
        cache.get(&sig("a"));
        cache.get(&sig("a"));

        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                invalidations: 0
            }
        );
    }
}
