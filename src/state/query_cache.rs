use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Listings,
    Logos,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Listings => "listings",
            Endpoint::Logos => "logos",
        }
    }
}

#[derive(Eq, Hash, PartialEq, Clone, Debug)]
pub struct QueryKey(
    pub Endpoint,
    pub String, // normalised parameters
);

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Response cache with a fixed staleness window per instance.
///
/// Cheap to clone: clones share the same map.
#[derive(Debug, Clone)]
pub struct QueryCache<V> {
    entries: Arc<DashMap<QueryKey, CachedEntry<V>>>,
    stale_after: Duration,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            stale_after,
        }
    }

    /// Value for `key` if it was stored less than `stale_after` ago.
    pub fn get_fresh(&self, key: &QueryKey) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.fetched_at.elapsed() < self.stale_after {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: QueryKey, value: V) {
        self.entries.insert(
            key,
            CachedEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop every entry past its staleness window.
    pub fn evict_stale(&self) {
        let stale_after = self.stale_after;
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() < stale_after);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
