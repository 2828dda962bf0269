//! Response cache for idempotent non-streaming requests.
//!
//! Entries expire `ttl` after insertion (checked lazily on read) and
//! capacity is bounded by LRU eviction. Keys are a deterministic hash
//! of the semantically relevant parts of a request; volatile fields
//! never participate, so identical conversational turns hit the cache.
//! Streaming calls bypass the cache by contract — enforced by the
//! client, which never consults it for a streaming request.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::types::ChatRequest;

/// A cached value with its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

/// Counters exposed through the diagnostics surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a live entry.
    pub hits: u64,
    /// Reads that found nothing, or only an expired entry.
    pub misses: u64,
    /// Entries displaced by capacity pressure.
    pub evictions: u64,
    /// Current number of entries (live and not-yet-collected expired).
    pub len: usize,
    /// Configured capacity.
    pub max_size: usize,
}

/// TTL + LRU bounded cache, owned by a single client instance.
pub struct ResponseCache<T: Clone> {
    config: CacheConfig,
    inner: Mutex<LruCache<u64, CacheEntry<T>>>,
    stats: Mutex<CacheStats>,
}

impl<T: Clone> ResponseCache<T> {
    /// Creates a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        let stats = CacheStats {
            max_size: capacity.get(),
            ..Default::default()
        };
        Self {
            config,
            inner: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(stats),
        }
    }

    /// Looks up a key, dropping the entry if its TTL has elapsed.
    pub fn get(&self, key: u64) -> Option<T> {
        let mut inner = self.inner.lock();
        let mut stats = self.stats.lock();

        let entry = inner.get(&key).map(|e| (e.value.clone(), e.expires_at));
        let value = match entry {
            Some((value, expires_at)) if expires_at > Instant::now() => Some(value),
            Some(_) => {
                inner.pop(&key);
                None
            }
            None => None,
        };

        match &value {
            Some(_) => stats.hits += 1,
            None => stats.misses += 1,
        }
        stats.len = inner.len();
        value
    }

    /// Inserts a value, evicting the least recently used entry when at
    /// capacity.
    pub fn insert(&self, key: u64, value: T) {
        let mut inner = self.inner.lock();
        let mut stats = self.stats.lock();

        let at_capacity = inner.len() == inner.cap().get() && !inner.contains(&key);
        if at_capacity {
            stats.evictions += 1;
        }

        inner.put(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.config.ttl,
            },
        );
        stats.len = inner.len();
    }

    /// Drops all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.clear();
        self.stats.lock().len = 0;
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.len = self.inner.lock().len();
        stats
    }
}

impl<T: Clone> std::fmt::Debug for ResponseCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Deterministic cache key over the semantically relevant parts of a
/// request: model id, message list, system instruction, and sampling
/// parameters. The `stream` flag and anything volatile (request ids,
/// timestamps) are excluded, so the same conversational turn always
/// maps to the same key.
pub fn request_cache_key(request: &ChatRequest) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();

    request.model.hash(&mut hasher);
    for message in &request.messages {
        message.role.hash(&mut hasher);
        message.content.hash(&mut hasher);
    }
    request.system_instruction.hash(&mut hasher);
    request.temperature.map(f32::to_bits).hash(&mut hasher);
    request.top_p.map(f32::to_bits).hash(&mut hasher);
    request.top_k.hash(&mut hasher);
    request.max_tokens.hash(&mut hasher);

    hasher.finish()
}
