//! Bounded satellite cache.
//!
//! Maps a location string to its compiled program. Strict LRU: a hit
//! refreshes recency, and inserting past capacity evicts the single
//! least-recently-touched entry. The location is used verbatim as the
//! key; a changed script behind an unchanged location is not observed
//! until its entry is evicted.
//!
//! Concurrent misses on the same location are not deduplicated. Both
//! callers fetch and compile, and the last insert wins; compilation is
//! a pure function of source text, so either result is valid.

use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::CompiledSatellite;

/// Thread-safe LRU cache of compiled satellites.
pub struct ScriptCache {
    inner: Mutex<Lru>,
}

struct Lru {
    capacity: usize,
    entries: HashMap<String, CompiledSatellite>,
    // Recency order, least recent at the front.
    order: VecDeque<String>,
}

impl ScriptCache {
    /// Create a cache holding at most `capacity` compiled satellites.
    ///
    /// Fails on zero capacity; the daemon treats that as fatal at
    /// startup.
    pub fn new(capacity: usize) -> anyhow::Result<Self> {
        if capacity == 0 {
            anyhow::bail!("cache capacity must be non-zero");
        }
        Ok(Self {
            inner: Mutex::new(Lru {
                capacity,
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        })
    }

    /// Look up a compiled satellite, refreshing its recency on a hit.
    pub async fn get(&self, location: &str) -> Option<CompiledSatellite> {
        let mut lru = self.inner.lock().await;
        let found = lru.entries.get(location).cloned();
        if found.is_some() {
            lru.touch(location);
        }
        found
    }

    /// Insert a compiled satellite, replacing any entry for the same
    /// location and evicting the least-recently-used entry beyond
    /// capacity.
    pub async fn insert(&self, location: &str, satellite: CompiledSatellite) {
        let mut lru = self.inner.lock().await;
        if lru.entries.insert(location.to_string(), satellite).is_some() {
            lru.touch(location);
            return;
        }
        lru.order.push_back(location.to_string());
        while lru.entries.len() > lru.capacity {
            let Some(oldest) = lru.order.pop_front() else {
                break;
            };
            lru.entries.remove(&oldest);
            debug!(location = %oldest, "evicted least-recently-used satellite");
        }
    }

    /// Number of cached satellites.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Lru {
    fn touch(&mut self, location: &str) {
        if let Some(pos) = self.order.iter().position(|existing| existing == location) {
            self.order.remove(pos);
        }
        self.order.push_back(location.to_string());
    }
}
