//! Storage Engine Module
//!
//! The concurrency-safe key/value/expiration store and its background
//! expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! Expirations are absolute unix-epoch milliseconds. Deleted keys are
//! tombstoned, not erased; the sweeper physically reclaims entries that
//! no longer resolve.
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::{StorageEngine, StoreError, NO_EXPIRY};
//! use bytes::Bytes;
//!
//! let engine = StorageEngine::new();
//! engine.set(Bytes::from("counter"), Bytes::from("41"), NO_EXPIRY);
//! assert_eq!(engine.add(&Bytes::from("counter"), 1), Ok(42));
//! assert_eq!(engine.delete(&Bytes::from("counter")), Ok(()));
//! assert_eq!(engine.get(&Bytes::from("counter")), Err(StoreError::NotFound));
//! ```

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{now_millis, Entry, StorageEngine, StoreError, NO_EXPIRY, TOMBSTONE};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper};
