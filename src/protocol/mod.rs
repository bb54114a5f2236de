//! RESP Protocol Implementation
//!
//! This module implements the subset of the Redis Serialization Protocol
//! (RESP) that EmberKV speaks: simple strings, simple errors, integers,
//! bulk strings, and arrays.
//!
//! ## Modules
//!
//! - `types`: the `RespValue` sum type and serialization
//! - `parser`: bounds-checked incremental parser for incoming data
//!
//! ## Example
//!
//! ```
//! use emberkv::protocol::{parse_message, RespValue};
//!
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (value, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! let response = RespValue::bulk_string("ember");
//! assert_eq!(response.serialize(), b"$5\r\nember\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
