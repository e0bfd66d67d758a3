//! # Timed Result Cache
//!
//! Memoizes fetched tide data so repeated requests for the same station and
//! window do not hit NOAA again. The cache is an owned service: whoever needs
//! it receives an `Arc<TimedCache<_>>`, there is no global instance.
//!
//! ## Expiry
//! - **On read**: an expired entry is removed and reported as a miss
//! - **Background sweep**: [`TimedCache::spawn_sweeper`] runs a tokio task that
//!   periodically drops expired entries nobody asked for again
//!
//! The sweep never holds the lock while walking the map. It copies the keys
//! under a short lock, then re-locks once per key to check and delete.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

struct Entry<V> {
    value: V,
    created: Instant,
}

/// Thread-safe map whose entries expire `ttl` after they were set.
pub struct TimedCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TimedCache<V> {
    pub fn new(ttl: Duration) -> Self {
        TimedCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, value: V) {
        self.set_at(key, value, Instant::now());
    }

    /// [`TimedCache::set`] with the clock factored out.
    pub fn set_at(&self, key: &str, value: V, now: Instant) {
        self.lock().insert(
            key.to_string(),
            Entry {
                value,
                created: now,
            },
        );
    }

    /// The value for `key`, unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// [`TimedCache::get`] with the clock factored out. Expired entries are
    /// evicted on the way out.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if self.expired(entry, now) {
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry that is expired at `now`; returns how many went.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let keys: Vec<String> = self.lock().keys().cloned().collect();
        let mut evicted = 0;
        for key in keys {
            let mut entries = self.lock();
            let stale = entries
                .get(&key)
                .is_some_and(|entry| self.expired(entry, now));
            if stale {
                entries.remove(&key);
                evicted += 1;
            }
        }
        evicted
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created) > self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        // Entries are only ever inserted or removed whole.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> TimedCache<V>
where
    V: Clone + Send + 'static,
{
    /// Sweep expired entries every `period` on the current tokio runtime.
    ///
    /// The task only holds a weak reference and exits on the first tick after
    /// the last `Arc` to the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("cache dropped, stopping sweeper");
                    break;
                };
                let evicted = cache.sweep();
                if evicted > 0 {
                    debug!(evicted, remaining = cache.len(), "swept expired cache entries");
                }
            }
        })
    }
}
