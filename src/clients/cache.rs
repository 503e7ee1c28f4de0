use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::guide::{FranchiseWatchGuide, WatchGuide};

/// Time source for TTL decisions, injected so tests can advance it.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Short-TTL memoization for raw provider responses, keyed by a
/// provider-qualified string such as `jikan:episodes:20:1`. Expired
/// entries are treated as misses and evicted lazily on access; there is
/// no background sweep.
pub struct ResponseCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ResponseCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if self.clock.now().duration_since(entry.inserted_at) < self.ttl => {
                debug!(key, "response cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.into(),
                CacheEntry {
                    value,
                    inserted_at: self.clock.now(),
                },
            );
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Memoized built guides. Three independent keyspaces: title id,
/// normalized free-text query, and franchise name. Entries never expire;
/// guides are assumed stable for the life of the process and a restart
/// clears everything.
#[derive(Default)]
pub struct GuideCache {
    by_id: Mutex<HashMap<i64, WatchGuide>>,
    by_search: Mutex<HashMap<String, WatchGuide>>,
    by_franchise: Mutex<HashMap<String, FranchiseWatchGuide>>,
}

impl GuideCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn guide_for_id(&self, id: i64) -> Option<WatchGuide> {
        self.by_id.lock().ok()?.get(&id).cloned()
    }

    pub fn store_guide(&self, id: i64, guide: &WatchGuide) {
        if let Ok(mut guides) = self.by_id.lock() {
            guides.insert(id, guide.clone());
        }
    }

    #[must_use]
    pub fn guide_for_search(&self, query: &str) -> Option<WatchGuide> {
        self.by_search.lock().ok()?.get(&normalize(query)).cloned()
    }

    pub fn store_search(&self, query: &str, guide: &WatchGuide) {
        if let Ok(mut guides) = self.by_search.lock() {
            guides.insert(normalize(query), guide.clone());
        }
    }

    #[must_use]
    pub fn franchise(&self, name: &str) -> Option<FranchiseWatchGuide> {
        self.by_franchise.lock().ok()?.get(&normalize(name)).cloned()
    }

    pub fn store_franchise(&self, name: &str, guide: &FranchiseWatchGuide) {
        if let Ok(mut guides) = self.by_franchise.lock() {
            guides.insert(normalize(name), guide.clone());
        }
    }

    /// (guides, searches, franchises) entry counts, for the status surface.
    #[must_use]
    pub fn sizes(&self) -> (usize, usize, usize) {
        (
            self.by_id.lock().map(|m| m.len()).unwrap_or(0),
            self.by_search.lock().map(|m| m.len()).unwrap_or(0),
            self.by_franchise.lock().map(|m| m.len()).unwrap_or(0),
        )
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}
