//! # fileflux-cache
//!
//! Content-addressed memoization of `(file, chunking options) → chunks`.
//!
//! The fingerprint is the SHA-256 of `path | mtime | size | strategy |
//! maxChunkSize | overlap`, truncated to 16 hex characters. Entries are
//! held in a bounded in-memory map with an access-time map beside it;
//! eviction runs in three ways:
//!
//! - at capacity, the oldest-accessed batch of entries is dropped in one
//!   pass;
//! - a periodic sweep drops entries not accessed within the expiration
//!   window;
//! - entries whose estimated memory exceeds the per-item cap are rejected
//!   at insertion (logged, not an error).
//!
//! The cache is shared across concurrent pipeline runs; all state sits
//! behind one mutex and insertions race-resolve last write wins.

use fileflux_core::{Chunk, ChunkingOptions};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Length of the hex fingerprint.
const FINGERPRINT_LEN: usize = 16;

/// Cache tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Entry-count cap; reaching it triggers a batch eviction.
    pub max_cache_size: usize,
    /// How many oldest-accessed entries one eviction pass removes.
    pub eviction_batch_size: usize,
    /// How often the TTL sweep runs.
    pub cleanup_interval: Duration,
    /// Entries idle longer than this are dropped by the sweep.
    pub expiration: Duration,
    /// Per-entry memory cap in bytes; larger entries are rejected.
    pub max_item_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: 256,
            eviction_batch_size: 32,
            cleanup_interval: Duration::from_secs(10 * 60),
            expiration: Duration::from_secs(24 * 60 * 60),
            max_item_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Fingerprint for a `(file, options)` pair.
///
/// `mtime` is the modification time in whole seconds since the epoch (or 0
/// when unknown) so the key is reproducible across runs.
pub fn fingerprint(
    path: &str,
    mtime_epoch_secs: i64,
    size: u64,
    options: &ChunkingOptions,
) -> String {
    let key = format!(
        "{path}|{mtime_epoch_secs}|{size}|{}|{}|{}",
        options.strategy, options.max_chunk_size, options.overlap_size
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..FINGERPRINT_LEN].to_string()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    chunks: Vec<Chunk>,
    estimated_bytes: usize,
    hit_count: u64,
    created: Instant,
}

#[derive(Debug)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    last_accessed: HashMap<String, Instant>,
    total_hits: u64,
    last_sweep: Instant,
}

/// Snapshot of cache state for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Current entry count.
    pub item_count: usize,
    /// Estimated memory held by entries, in bytes.
    pub memory_bytes: usize,
    /// Total hits since construction.
    pub total_hits: u64,
    /// Configured entry-count cap.
    pub max_cache_size: usize,
    /// Configured per-entry byte cap.
    pub max_item_bytes: usize,
    /// Age of the oldest-accessed entry.
    pub oldest_age: Duration,
    /// Hits per held byte, a rough memory-efficiency measure. Zero when
    /// empty.
    pub memory_efficiency: f64,
}

/// Bounded chunk cache shared across pipeline runs.
#[derive(Debug)]
pub struct ChunkCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ChunkCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                last_accessed: HashMap::new(),
                total_hits: 0,
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Look up chunks by fingerprint. Updates access time and hit count.
    pub fn get(&self, key: &str) -> Option<Vec<Chunk>> {
        let mut inner = self.inner.lock().expect("cache lock");
        self.maybe_sweep(&mut inner);
        let now = Instant::now();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.hit_count += 1;
            let chunks = entry.chunks.clone();
            inner.total_hits += 1;
            inner.last_accessed.insert(key.to_string(), now);
            Some(chunks)
        } else {
            None
        }
    }

    /// Insert chunks under a fingerprint.
    ///
    /// Oversized entries are rejected with a log line; at capacity the
    /// oldest-accessed batch is evicted first. An existing entry under the
    /// same key is replaced (last write wins).
    pub fn insert(&self, key: &str, chunks: Vec<Chunk>) {
        let estimated_bytes = estimate_bytes(&chunks);
        if estimated_bytes > self.config.max_item_bytes {
            tracing::info!(
                key,
                estimated_bytes,
                cap = self.config.max_item_bytes,
                "cache entry over per-item cap, not stored"
            );
            return;
        }

        let mut inner = self.inner.lock().expect("cache lock");
        self.maybe_sweep(&mut inner);
        if !inner.entries.contains_key(key) && inner.entries.len() >= self.config.max_cache_size {
            self.evict_oldest_batch(&mut inner);
        }
        let now = Instant::now();
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                chunks,
                estimated_bytes,
                hit_count: 0,
                created: now,
            },
        );
        inner.last_accessed.insert(key.to_string(), now);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache lock");
        inner.entries.clear();
        inner.last_accessed.clear();
    }

    /// Evict entries idle longer than the configured expiration.
    ///
    /// Runs automatically on access at the configured interval; exposed for
    /// callers that want deterministic sweeps.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache lock");
        self.sweep_now(&mut inner)
    }

    /// Snapshot current statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock");
        let memory_bytes: usize = inner.entries.values().map(|e| e.estimated_bytes).sum();
        let now = Instant::now();
        let oldest_age = inner
            .last_accessed
            .values()
            .map(|t| now.duration_since(*t))
            .max()
            .unwrap_or(Duration::ZERO);
        let memory_efficiency = if memory_bytes == 0 {
            0.0
        } else {
            inner.total_hits as f64 / memory_bytes as f64
        };
        CacheStats {
            item_count: inner.entries.len(),
            memory_bytes,
            total_hits: inner.total_hits,
            max_cache_size: self.config.max_cache_size,
            max_item_bytes: self.config.max_item_bytes,
            oldest_age,
            memory_efficiency,
        }
    }

    fn maybe_sweep(&self, inner: &mut CacheInner) {
        if inner.last_sweep.elapsed() >= self.config.cleanup_interval {
            self.sweep_now(inner);
        }
    }

    fn sweep_now(&self, inner: &mut CacheInner) -> usize {
        let now = Instant::now();
        inner.last_sweep = now;
        let expired: Vec<String> = inner
            .last_accessed
            .iter()
            .filter(|(_, t)| now.duration_since(**t) >= self.config.expiration)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.entries.remove(key);
            inner.last_accessed.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!(evicted = expired.len(), "cache TTL sweep");
        }
        expired.len()
    }

    fn evict_oldest_batch(&self, inner: &mut CacheInner) {
        let mut by_age: Vec<(String, Instant)> = inner
            .last_accessed
            .iter()
            .map(|(k, t)| (k.clone(), *t))
            .collect();
        by_age.sort_by_key(|(_, t)| *t);
        let batch = self.config.eviction_batch_size.max(1);
        for (key, _) in by_age.into_iter().take(batch) {
            inner.entries.remove(&key);
            inner.last_accessed.remove(&key);
        }
    }
}

/// Rough memory estimate of a chunk list: content plus serialized props.
fn estimate_bytes(chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .map(|c| {
            c.content.len()
                + c.id.len()
                + c.props
                    .iter()
                    .map(|(k, v)| k.len() + v.to_string().len())
                    .sum::<usize>()
                + 64
        })
        .sum()
}
