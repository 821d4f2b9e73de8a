// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-bucketed result cache in front of the search engine.
//!
//! Entries are keyed by normalized query and live in a bounded LRU. Time is
//! cut into fixed buckets of `bucket_secs`; when the bucket changes the whole
//! cache is dropped at once instead of expiring entries one by one.

use anyhow::Result;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::engine::SearchEngine;
use crate::normalize::normalize;
use crate::response::SearchResponse;

/// Default bucket width in seconds.
pub const DEFAULT_BUCKET_SECS: u64 = 300;
/// Default number of entries kept per bucket.
pub const DEFAULT_CAPACITY: usize = 128;

/// Source of the current time, in whole seconds.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

/// Wall-clock time since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(secs),
        }
    }

    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }
}

/// Cache key components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Normalized query text
    pub query: String,
    /// Maximum results requested
    pub top_k: usize,
}

impl CacheKey {
    pub fn new(query: &str, top_k: usize) -> Self {
        Self {
            query: normalize(query),
            top_k,
        }
    }
}

/// Counters reported by [`ResultCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub bucket: u64,
}

struct CacheState {
    bucket: u64,
    entries: LruCache<CacheKey, SearchResponse>,
}

pub struct ResultCache {
    clock: Arc<dyn Clock>,
    bucket_secs: u64,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(clock: Arc<dyn Clock>, bucket_secs: u64, capacity: usize) -> Self {
        let bucket_secs = bucket_secs.max(1);
        let bucket = clock.now_secs() / bucket_secs;
        Self {
            clock,
            bucket_secs,
            state: Mutex::new(CacheState {
                bucket,
                entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Wall-clock cache with the default bucket width and capacity.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_BUCKET_SECS, DEFAULT_CAPACITY)
    }

    pub fn current_bucket(&self) -> u64 {
        self.clock.now_secs() / self.bucket_secs
    }

    /// Returns the cached response for `key`, or runs `compute` and stores
    /// its result.
    ///
    /// `compute` runs without the lock held, so concurrent misses on the same
    /// key may both compute; the last write wins. Errors are not cached.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<SearchResponse>
    where
        F: FnOnce() -> Result<SearchResponse>,
    {
        let bucket = self.current_bucket();
        {
            let mut state = self.lock();
            roll(&mut state, bucket);
            if state.bucket == bucket {
                if let Some(hit) = state.entries.get(&key) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(query = %key.query, bucket, "cache hit");
                    return Ok(hit.clone());
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(query = %key.query, bucket, "cache miss");
        let response = compute()?;

        let now = self.current_bucket();
        if now == bucket {
            let mut state = self.lock();
            roll(&mut state, bucket);
            if state.bucket == bucket {
                state.entries.put(key, response.clone());
            }
        } else {
            debug!(from = bucket, to = now, "bucket rolled over during search");
        }
        Ok(response)
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: state.entries.len(),
            bucket: state.bucket,
        }
    }

    // Poisoning is ignored: every write replaces whole entries.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Moves the cache forward to `bucket`, dropping everything from older
/// buckets. Never moves backwards.
fn roll(state: &mut CacheState, bucket: u64) {
    if bucket > state.bucket {
        debug!(
            from = state.bucket,
            to = bucket,
            dropped = state.entries.len(),
            "cache bucket rollover"
        );
        state.entries.clear();
        state.bucket = bucket;
    }
}

/// Search engine handle with a result cache in front of it.
pub struct CachedSearcher {
    engine: Arc<SearchEngine>,
    cache: Option<ResultCache>,
    top_k: usize,
}

impl CachedSearcher {
    pub fn new(engine: Arc<SearchEngine>, cache: ResultCache, top_k: usize) -> Self {
        Self {
            engine,
            cache: Some(cache),
            top_k: top_k.max(1),
        }
    }

    /// Passes every query straight to the engine.
    pub fn uncached(engine: Arc<SearchEngine>, top_k: usize) -> Self {
        Self {
            engine,
            cache: None,
            top_k: top_k.max(1),
        }
    }

    pub fn engine(&self) -> &Arc<SearchEngine> {
        &self.engine
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Cached search. A hit skips the embedding call and is readdressed to
    /// this query's raw text, since entries are shared by every spelling
    /// that normalizes alike.
    pub fn search(&self, query: &str) -> Result<SearchResponse> {
        match &self.cache {
            Some(cache) => cache
                .get_or_compute(CacheKey::new(query, self.top_k), || {
                    self.engine.search(query, self.top_k)
                })
                .map(|response| response.readdressed(query)),
            None => self.engine.search(query, self.top_k),
        }
    }

    pub fn stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResultCache::stats)
    }
}
