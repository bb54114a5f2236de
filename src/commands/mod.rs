//! Command Handler Module
//!
//! The command processing layer: it receives parsed RESP commands,
//! executes them against the storage engine, and returns responses.
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! Supported commands: `PING`, `ECHO`, `SET` (with `EX`/`PX`/`EXAT`/`PXAT`
//! expiration modifiers), `GET`, `EXISTS`, `DEL`, `INCR`, `DECR`.

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
