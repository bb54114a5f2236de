//! # EmberKV - A Minimal In-Memory Key-Value Server
//!
//! EmberKV is a small Redis-compatible, in-memory key-value server. It
//! speaks a subset of the RESP wire protocol and stores string values with
//! millisecond-precision absolute expirations.
//!
//! ## Architecture
//!
//! ```text
//! bytes in ──> RESP parser ──> command array ──> CommandHandler
//!                                                     │
//!                                                     ▼
//! bytes out <── RESP encoder <── result value <── StorageEngine
//! ```
//!
//! - [`protocol`]: RESP value type, encoder, and bounds-checked parser
//! - [`storage`]: sharded concurrent store with tombstone-based deletion
//!   and a background expiry sweeper
//! - [`commands`]: dispatch from decoded arrays to engine operations
//! - [`connection`]: per-client read/parse/execute/respond loop
//!
//! ## Supported Commands
//!
//! `PING`, `ECHO`, `SET` (with `EX`/`PX`/`EXAT`/`PXAT` expiration
//! modifiers), `GET`, `EXISTS`, `DEL`, `INCR`, `DECR`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use emberkv::commands::CommandHandler;
//! use emberkv::connection::{handle_connection, ConnectionStats};
//! use emberkv::storage::{start_expiry_sweeper, StorageEngine};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(StorageEngine::new());
//!     let _sweeper = start_expiry_sweeper(Arc::clone(&storage));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await.unwrap();
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&storage));
//!         tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//!     }
//! }
//! ```

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RespParser, RespValue};
pub use storage::{start_expiry_sweeper, StorageEngine, StoreError};

/// The default port EmberKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host EmberKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
