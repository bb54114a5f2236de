//! Command Handler Module
//!
//! Receives a decoded RESP array whose first element names a command,
//! executes it against the storage engine, and produces the RESP response.
//!
//! ## Supported Commands
//!
//! - `PING` - liveness check
//! - `ECHO message` - echo the message back
//! - `SET key value [EX s | PX ms | EXAT unix-s | PXAT unix-ms]`
//! - `GET key`
//! - `EXISTS key [key ...]` - count of currently-live keys
//! - `DEL key [key ...]` - count of successful deletions
//! - `INCR key` / `DECR key`
//!
//! Command names are matched case-insensitively; everything else is
//! byte-exact. A malformed argument shape (wrong arity, non-bulk-string
//! where one is required) yields `None`, which tells the connection
//! handler to produce no response for that command.

use crate::protocol::RespValue;
use crate::storage::{now_millis, StorageEngine, StoreError, NO_EXPIRY, TOMBSTONE};
use bytes::Bytes;
use std::sync::Arc;
use tracing::warn;

/// Error text for arithmetic failures, matching the Redis wording.
const ERR_NOT_INTEGER: &str = "ERR value is not an integer or out of range";

/// Expiration modifiers accepted by `SET`.
///
/// `EX`/`PX` are relative to now; `EXAT`/`PXAT` are absolute. All four
/// resolve to an absolute unix-epoch millisecond value before reaching
/// the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpirationOpt {
    Ex,
    Px,
    Exat,
    Pxat,
}

impl ExpirationOpt {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "EX" => Some(Self::Ex),
            "PX" => Some(Self::Px),
            "EXAT" => Some(Self::Exat),
            "PXAT" => Some(Self::Pxat),
            _ => None,
        }
    }

    /// Resolves the raw argument to an absolute millisecond epoch.
    ///
    /// Returns `None` for an unparsable argument or one whose resolution
    /// overflows `i64`. A resolved timestamp at or before the epoch would
    /// collide with the engine's sentinels, so it maps to [`TOMBSTONE`]:
    /// the key is already expired.
    fn resolve(self, raw: &str) -> Option<i64> {
        let n: i64 = raw.parse().ok()?;
        let at = match self {
            Self::Ex => n.checked_mul(1000)?.checked_add(now_millis())?,
            Self::Px => now_millis().checked_add(n)?,
            Self::Exat => n.checked_mul(1000)?,
            Self::Pxat => n,
        };
        Some(if at <= 0 { TOMBSTONE } else { at })
    }
}

/// Executes commands against the storage engine.
///
/// Cheap to clone: connections share one engine behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler backed by the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// Executes a command and returns the response.
    ///
    /// Returns `None` when the command's shape is malformed (not an array,
    /// empty, or required arguments missing/mistyped); the caller writes
    /// no response in that case.
    pub fn execute(&self, command: RespValue) -> Option<RespValue> {
        let args = command.into_array()?;
        let name = args.first()?.as_str()?.to_string();

        match name.to_uppercase().as_str() {
            "PING" => Some(RespValue::pong()),
            "ECHO" => self.cmd_echo(&args[1..]),
            "SET" => self.cmd_set(&args[1..]),
            "GET" => self.cmd_get(&args[1..]),
            "EXISTS" => Some(self.cmd_exists(&args[1..])),
            "DEL" => Some(self.cmd_del(&args[1..])),
            "INCR" => self.cmd_add(&args[1..], 1),
            "DECR" => self.cmd_add(&args[1..], -1),
            _ => Some(RespValue::error(format!("ERR unknown command '{}'", name))),
        }
    }

    /// ECHO message
    fn cmd_echo(&self, args: &[RespValue]) -> Option<RespValue> {
        let message = arg_bytes(args.first()?)?;
        Some(RespValue::bulk_string(message))
    }

    /// SET key value [EX seconds | PX millis | EXAT unix-seconds | PXAT unix-millis]
    fn cmd_set(&self, args: &[RespValue]) -> Option<RespValue> {
        let (key, value) = match args {
            [key, value] => (arg_bytes(key)?, arg_bytes(value)?),
            [key, value, option, raw] => {
                let key = arg_bytes(key)?;
                let value = arg_bytes(value)?;
                let option = ExpirationOpt::from_name(arg_str(option)?)?;
                let raw = arg_str(raw)?;
                let Some(expires_at) = option.resolve(raw) else {
                    // Unparsable or overflowing expiration argument is
                    // reported to the client instead of silently dropping
                    // the command.
                    warn!(raw, "invalid expiration argument");
                    return Some(RespValue::error(ERR_NOT_INTEGER));
                };
                self.storage.set(key, value, expires_at);
                return Some(RespValue::ok());
            }
            _ => return None,
        };

        self.storage.set(key, value, NO_EXPIRY);
        Some(RespValue::ok())
    }

    /// GET key
    fn cmd_get(&self, args: &[RespValue]) -> Option<RespValue> {
        let key = arg_bytes(args.first()?)?;
        match self.storage.get(&key) {
            Ok(value) => Some(RespValue::bulk_string(value)),
            Err(StoreError::NotFound) => Some(RespValue::null_bulk_string()),
            Err(e) => Some(RespValue::error(format!("ERR {}", e))),
        }
    }

    /// EXISTS key [key ...]
    ///
    /// Non-bulk-string arguments are skipped rather than failing the
    /// whole command.
    fn cmd_exists(&self, args: &[RespValue]) -> RespValue {
        let count = args
            .iter()
            .filter_map(arg_bytes)
            .filter(|key| self.storage.exists(key))
            .count();
        RespValue::integer(count as i64)
    }

    /// DEL key [key ...]
    fn cmd_del(&self, args: &[RespValue]) -> RespValue {
        let count = args
            .iter()
            .filter_map(arg_bytes)
            .filter(|key| self.storage.delete(key).is_ok())
            .count();
        RespValue::integer(count as i64)
    }

    /// INCR key / DECR key
    fn cmd_add(&self, args: &[RespValue], delta: i64) -> Option<RespValue> {
        let key = arg_bytes(args.first()?)?;
        match self.storage.add(&key, delta) {
            Ok(new_value) => Some(RespValue::integer(new_value)),
            Err(e) => {
                warn!(key = %String::from_utf8_lossy(&key), error = %e, "arithmetic command failed");
                Some(RespValue::error(ERR_NOT_INTEGER))
            }
        }
    }
}

/// Extracts the payload of a non-null bulk string argument.
fn arg_bytes(value: &RespValue) -> Option<Bytes> {
    match value {
        RespValue::BulkString(Some(b)) => Some(b.clone()),
        _ => None,
    }
}

/// Extracts a non-null bulk string argument as UTF-8 text.
///
/// Only bulk strings qualify; a simple string in an argument position is
/// a malformed shape.
fn arg_str(value: &RespValue) -> Option<&str> {
    match value {
        RespValue::BulkString(Some(b)) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}
