//! Thread-Safe Storage Engine with Absolute Expiration
//!
//! The engine holds every key's value together with its expiration in a
//! single entry, so a concurrent reader can never observe a value paired
//! with a stale expiration.
//!
//! ## Expiration Model
//!
//! Expirations are absolute unix-epoch milliseconds with two sentinels:
//!
//! - `NO_EXPIRY` (0): the key never expires
//! - `TOMBSTONE` (-1): the key was deleted and is treated as already
//!   expired regardless of the clock
//!
//! Deletion writes the tombstone instead of erasing the map slot, which
//! keeps liveness checking single-pathed: `Entry::is_live` is the one
//! authoritative predicate shared by `get`, `delete`, `add`, and `exists`.
//! Dead entries are physically reclaimed by the background sweeper.
//!
//! ## Concurrency Model
//!
//! Keys are distributed across shards by hash; each shard is an
//! independent `RwLock<HashMap>`. Readers of a shard run concurrently,
//! writers are exclusive, and no operation holds a lock beyond its own
//! critical section. Each operation is atomic only with respect to its
//! own key.

use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Number of shards for the storage engine.
/// More shards = less lock contention, but more memory overhead.
const NUM_SHARDS: usize = 64;

/// Expiration sentinel: the key never expires.
pub const NO_EXPIRY: i64 = 0;

/// Expiration sentinel: the key was deleted and is already expired.
pub const TOMBSTONE: i64 = -1;

/// Errors returned by storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key was never set, was deleted, or has expired
    #[error("key not found")]
    NotFound,

    /// The stored value does not parse as a signed 64-bit integer
    #[error("value is not an integer")]
    NotAnInteger,

    /// The arithmetic result would overflow a signed 64-bit integer
    #[error("increment or decrement would overflow")]
    OutOfRange,
}

/// Returns the current unix epoch time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A stored value and its expiration, updated as a single unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored value
    pub value: Bytes,
    /// Absolute expiration in unix-epoch milliseconds, or a sentinel
    pub expires_at: i64,
}

impl Entry {
    /// Creates a new entry.
    pub fn new(value: Bytes, expires_at: i64) -> Self {
        Self { value, expires_at }
    }

    /// The single authoritative liveness predicate.
    ///
    /// A tombstoned entry is never live; an entry with `NO_EXPIRY` always
    /// is; otherwise the key is live strictly before its expiration.
    #[inline]
    pub fn is_live(&self, now_ms: i64) -> bool {
        match self.expires_at {
            NO_EXPIRY => true,
            TOMBSTONE => false,
            at => now_ms < at,
        }
    }
}

/// A single shard holding a portion of the key space.
#[derive(Debug, Default)]
struct Shard {
    entries: RwLock<HashMap<Bytes, Entry>>,
}

/// The concurrent key/value/expiration store.
///
/// Designed to be wrapped in an `Arc` and shared across all connection
/// tasks; every operation is safe to call concurrently.
///
/// # Example
///
/// ```
/// use emberkv::storage::{StorageEngine, NO_EXPIRY};
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
/// engine.set(Bytes::from("name"), Bytes::from("ember"), NO_EXPIRY);
/// assert_eq!(engine.get(&Bytes::from("name")), Ok(Bytes::from("ember")));
/// ```
#[derive(Debug)]
pub struct StorageEngine {
    shards: Vec<Shard>,
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a new storage engine.
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| Shard::default()).collect(),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    /// Unconditionally stores a value with an absolute expiration.
    ///
    /// `expires_at` of [`NO_EXPIRY`] means the key never expires. Setting a
    /// tombstoned or expired key revives it. This operation cannot fail.
    pub fn set(&self, key: Bytes, value: Bytes, expires_at: i64) {
        let mut entries = self.shard(&key).entries.write().unwrap();
        entries.insert(key, Entry::new(value, expires_at));
    }

    /// Returns the value for a live key.
    ///
    /// Fails with [`StoreError::NotFound`] if the key was never set, was
    /// deleted, or has expired. Reads never mutate entries.
    pub fn get(&self, key: &Bytes) -> Result<Bytes, StoreError> {
        let entries = self.shard(key).entries.read().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_live(now_millis()) => Ok(entry.value.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Returns whether a key currently resolves.
    pub fn exists(&self, key: &Bytes) -> bool {
        let entries = self.shard(key).entries.read().unwrap();
        entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now_millis()))
    }

    /// Deletes a live key by writing the tombstone sentinel.
    ///
    /// Fails with [`StoreError::NotFound`] if the key does not currently
    /// resolve. A second delete of the same key therefore also fails.
    pub fn delete(&self, key: &Bytes) -> Result<(), StoreError> {
        let mut entries = self.shard(key).entries.write().unwrap();
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now_millis()) => {
                entry.expires_at = TOMBSTONE;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    /// Adds `delta` to the integer stored at `key` and returns the sum.
    ///
    /// An absent or expired key behaves as `set(key, delta, NO_EXPIRY)` and
    /// returns `delta`. A live key keeps its expiration. Fails with
    /// [`StoreError::NotAnInteger`] if the stored value is not numeric and
    /// [`StoreError::OutOfRange`] on signed 64-bit overflow in either
    /// direction.
    pub fn add(&self, key: &Bytes, delta: i64) -> Result<i64, StoreError> {
        let mut entries = self.shard(key).entries.write().unwrap();
        let now = now_millis();

        if let Some(entry) = entries.get_mut(key) {
            if entry.is_live(now) {
                let current: i64 = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(StoreError::NotAnInteger)?;
                let next = current.checked_add(delta).ok_or(StoreError::OutOfRange)?;
                entry.value = Bytes::from(next.to_string());
                return Ok(next);
            }
        }

        entries.insert(
            key.clone(),
            Entry::new(Bytes::from(delta.to_string()), NO_EXPIRY),
        );
        Ok(delta)
    }

    /// Returns the number of physical entries, dead ones included.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.entries.read().unwrap().len())
            .sum()
    }

    /// Returns true if the engine holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry that is no longer live and returns how many
    /// were reclaimed.
    ///
    /// Dropping a dead entry is observationally identical to leaving its
    /// tombstone in place, so this only reclaims memory.
    pub fn sweep_dead(&self) -> usize {
        let now = now_millis();
        let mut removed = 0;
        for shard in &self.shards {
            let mut entries = shard.entries.write().unwrap();
            let before = entries.len();
            entries.retain(|_, entry| entry.is_live(now));
            removed += before - entries.len();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn key(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();
        engine.set(key("name"), Bytes::from("ember"), NO_EXPIRY);
        assert_eq!(engine.get(&key("name")), Ok(Bytes::from("ember")));
    }

    #[test]
    fn test_set_overwrites() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("one"), NO_EXPIRY);
        engine.set(key("k"), Bytes::from("two"), NO_EXPIRY);
        assert_eq!(engine.get(&key("k")), Ok(Bytes::from("two")));
    }

    #[test]
    fn test_get_missing_key() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get(&key("nope")), Err(StoreError::NotFound));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("v"), NO_EXPIRY);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(engine.get(&key("k")), Ok(Bytes::from("v")));
    }

    #[test]
    fn test_get_before_and_after_expiration() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("v"), now_millis() + 50);
        assert_eq!(engine.get(&key("k")), Ok(Bytes::from("v")));
        thread::sleep(Duration::from_millis(70));
        assert_eq!(engine.get(&key("k")), Err(StoreError::NotFound));
    }

    #[test]
    fn test_get_past_expiration() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("v"), now_millis() - 1);
        assert_eq!(engine.get(&key("k")), Err(StoreError::NotFound));
    }

    #[test]
    fn test_set_revives_expired_key() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("old"), now_millis() - 1);
        engine.set(key("k"), Bytes::from("new"), NO_EXPIRY);
        assert_eq!(engine.get(&key("k")), Ok(Bytes::from("new")));
    }

    #[test]
    fn test_delete_then_get_fails() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("v"), NO_EXPIRY);
        assert_eq!(engine.delete(&key("k")), Ok(()));
        assert_eq!(engine.get(&key("k")), Err(StoreError::NotFound));
    }

    #[test]
    fn test_double_delete_fails() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("v"), NO_EXPIRY);
        assert_eq!(engine.delete(&key("k")), Ok(()));
        assert_eq!(engine.delete(&key("k")), Err(StoreError::NotFound));
    }

    #[test]
    fn test_delete_missing_key_fails() {
        let engine = StorageEngine::new();
        assert_eq!(engine.delete(&key("nope")), Err(StoreError::NotFound));
    }

    #[test]
    fn test_set_revives_tombstoned_key() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("v"), NO_EXPIRY);
        engine.delete(&key("k")).unwrap();
        engine.set(key("k"), Bytes::from("back"), NO_EXPIRY);
        assert_eq!(engine.get(&key("k")), Ok(Bytes::from("back")));
    }

    #[test]
    fn test_add_creates_missing_key() {
        let engine = StorageEngine::new();
        assert_eq!(engine.add(&key("counter"), 5), Ok(5));
        assert_eq!(engine.get(&key("counter")), Ok(Bytes::from("5")));
    }

    #[test]
    fn test_add_accumulates() {
        let engine = StorageEngine::new();
        assert_eq!(engine.add(&key("counter"), 5), Ok(5));
        assert_eq!(engine.add(&key("counter"), -3), Ok(2));
        assert_eq!(engine.get(&key("counter")), Ok(Bytes::from("2")));
    }

    #[test]
    fn test_add_on_expired_key_starts_over() {
        let engine = StorageEngine::new();
        engine.set(key("counter"), Bytes::from("100"), now_millis() - 1);
        assert_eq!(engine.add(&key("counter"), 7), Ok(7));
        // The recreated counter has no expiration.
        assert_eq!(engine.get(&key("counter")), Ok(Bytes::from("7")));
    }

    #[test]
    fn test_add_keeps_expiration_of_live_key() {
        let engine = StorageEngine::new();
        let expires_at = now_millis() + 60_000;
        engine.set(key("counter"), Bytes::from("1"), expires_at);
        assert_eq!(engine.add(&key("counter"), 1), Ok(2));
        let entries = engine.shard(b"counter").entries.read().unwrap();
        assert_eq!(entries.get(&key("counter")).unwrap().expires_at, expires_at);
    }

    #[test]
    fn test_add_non_integer_value() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from("not a number"), NO_EXPIRY);
        assert_eq!(engine.add(&key("k"), 1), Err(StoreError::NotAnInteger));
    }

    #[test]
    fn test_add_overflow() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from(i64::MAX.to_string()), NO_EXPIRY);
        assert_eq!(engine.add(&key("k"), 1), Err(StoreError::OutOfRange));
        // The stored value is untouched after a failed add.
        assert_eq!(engine.get(&key("k")), Ok(Bytes::from(i64::MAX.to_string())));
    }

    #[test]
    fn test_add_underflow() {
        let engine = StorageEngine::new();
        engine.set(key("k"), Bytes::from(i64::MIN.to_string()), NO_EXPIRY);
        assert_eq!(engine.add(&key("k"), -1), Err(StoreError::OutOfRange));
    }

    #[test]
    fn test_exists_follows_liveness() {
        let engine = StorageEngine::new();
        engine.set(key("live"), Bytes::from("v"), NO_EXPIRY);
        engine.set(key("expired"), Bytes::from("v"), now_millis() - 1);
        assert!(engine.exists(&key("live")));
        assert!(!engine.exists(&key("expired")));
        assert!(!engine.exists(&key("missing")));

        engine.delete(&key("live")).unwrap();
        assert!(!engine.exists(&key("live")));
    }

    #[test]
    fn test_sweep_dead_reclaims_only_dead_entries() {
        let engine = StorageEngine::new();
        engine.set(key("live"), Bytes::from("v"), NO_EXPIRY);
        engine.set(key("expired"), Bytes::from("v"), now_millis() - 1);
        engine.set(key("deleted"), Bytes::from("v"), NO_EXPIRY);
        engine.delete(&key("deleted")).unwrap();

        assert_eq!(engine.len(), 3);
        assert_eq!(engine.sweep_dead(), 2);
        assert_eq!(engine.len(), 1);
        assert!(engine.exists(&key("live")));
    }

    #[test]
    fn test_concurrent_counters() {
        let engine = Arc::new(StorageEngine::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        engine.add(&key("counter"), 1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.get(&key("counter")), Ok(Bytes::from("8000")));
    }

    #[test]
    fn test_concurrent_set_get_distinct_keys() {
        let engine = Arc::new(StorageEngine::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..500 {
                        let k = key(&format!("key:{}:{}", t, i));
                        engine.set(k.clone(), Bytes::from("v"), NO_EXPIRY);
                        assert_eq!(engine.get(&k), Ok(Bytes::from("v")));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 2000);
    }
}
