//! Incremental RESP Protocol Parser
//!
//! The parser turns a byte buffer into a typed [`RespValue`] plus the exact
//! number of bytes that value occupied on the wire. Exact-length accounting
//! is what lets the connection loop walk a buffer containing several
//! back-to-back commands.
//!
//! ## Contract
//!
//! `parse()` returns one of:
//! - `Ok(Some((value, consumed)))` - a complete value, `consumed` bytes used
//! - `Ok(None)` - nothing to parse yet: the buffer is empty, starts with an
//!   unrecognized prefix byte, or holds a truncated value. The caller reads
//!   more data (or stops iterating over the current buffer).
//! - `Err(ParseError)` - structurally malformed input
//!
//! Declared lengths are never trusted blindly: a bulk string or array header
//! promising more bytes than the buffer holds yields `Ok(None)` instead of
//! reading out of range.
//!
//! Integer bodies that fail to parse degrade to value `0` with the bytes
//! still consumed. Re-encoding such a value will not reproduce the original
//! bytes; the round-trip law only covers well-formed input.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during RESP parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid UTF-8 in a simple string, error, or length line
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Unparsable length field in a bulk string or array header
    #[error("invalid length field: {0:?}")]
    InvalidLength(String),

    /// Protocol violation (missing CRLF after a bulk payload, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The declared payload exceeds the maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// An incremental RESP parser.
///
/// The parser is stateless between calls apart from recursion-depth
/// tracking; partial input is simply reported as `Ok(None)` and retried by
/// the caller once more bytes arrive.
#[derive(Debug, Default)]
pub struct RespParser {
    /// Current nesting depth (for array parsing)
    depth: usize,
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to parse a RESP value from the buffer.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.depth = 0;
        self.parse_value(buf)
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => self.parse_simple_string(buf),
            prefix::ERROR => self.parse_error(buf),
            prefix::INTEGER => self.parse_integer(buf),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf),
            // Unrecognized prefix: not fatal at this layer. Nothing is
            // consumed, which also ends iteration over a pipelined buffer.
            _ => Ok(None),
        }
    }

    /// Parses a simple string: `+<string>\r\n`
    fn parse_simple_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::SIMPLE_STRING);

        match find_crlf(&buf[1..]) {
            Some(pos) => {
                let s = utf8_line(&buf[1..1 + pos])?;
                // +1 for prefix, +2 for CRLF
                let consumed = 1 + pos + 2;
                Ok(Some((RespValue::SimpleString(s.to_string()), consumed)))
            }
            None => Ok(None), // Incomplete
        }
    }

    /// Parses an error: `-<error message>\r\n`
    fn parse_error(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::ERROR);

        match find_crlf(&buf[1..]) {
            Some(pos) => {
                let s = utf8_line(&buf[1..1 + pos])?;
                let consumed = 1 + pos + 2;
                Ok(Some((RespValue::Error(s.to_string()), consumed)))
            }
            None => Ok(None),
        }
    }

    /// Parses an integer: `:<integer>\r\n` or `:+<integer>\r\n`
    ///
    /// A leading `+` is recorded so encoding reproduces it. Unparsable
    /// bodies yield value `0` rather than an error.
    fn parse_integer(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::INTEGER);

        match find_crlf(&buf[1..]) {
            Some(pos) => {
                let s = utf8_line(&buf[1..1 + pos])?;
                let explicit_plus = s.starts_with('+');
                let value: i64 = s.parse().unwrap_or(0);
                let consumed = 1 + pos + 2;
                Ok(Some((
                    RespValue::Integer {
                        value,
                        explicit_plus,
                    },
                    consumed,
                )))
            }
            None => Ok(None),
        }
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`
    ///
    /// Exactly `length` payload bytes are taken; an embedded `\r\n` inside
    /// the payload never terminates the value.
    fn parse_bulk_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::BULK_STRING);

        let length_end = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let length = parse_length(&buf[1..1 + length_end])?;

        // Null bulk string: $-1\r\n
        if length == -1 {
            let consumed = 1 + length_end + 2;
            return Ok(Some((RespValue::BulkString(None), consumed)));
        }

        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;

        if length > MAX_BULK_SIZE {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let data_start = 1 + length_end + 2; // prefix + length line + CRLF
        let total_needed = data_start + length + 2; // payload + CRLF

        // The declared length is a claim, not a guarantee.
        if buf.len() < total_needed {
            return Ok(None); // Incomplete
        }

        if &buf[data_start + length..data_start + length + 2] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);

        Ok(Some((RespValue::BulkString(Some(data)), total_needed)))
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    ///
    /// Elements are decoded recursively in declared order, accumulating the
    /// consumed byte count.
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        debug_assert!(buf[0] == prefix::ARRAY);

        let count_end = match find_crlf(&buf[1..]) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let count = parse_length(&buf[1..1 + count_end])?;

        // Null array: *-1\r\n
        if count == -1 {
            let consumed = 1 + count_end + 2;
            return Ok(Some((RespValue::Array(None), consumed)));
        }

        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        let mut elements = Vec::with_capacity(count.min(1024));
        let mut consumed = 1 + count_end + 2; // *<count>\r\n

        self.depth += 1;

        for _ in 0..count {
            if consumed >= buf.len() {
                return Ok(None); // Incomplete
            }

            match self.parse_value(&buf[consumed..])? {
                Some((value, element_consumed)) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                None => return Ok(None), // Incomplete element
            }
        }

        self.depth -= 1;

        Ok(Some((RespValue::Array(Some(elements)), consumed)))
    }
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    for i in 0..buf.len().saturating_sub(1) {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            return Some(i);
        }
    }
    None
}

/// Decodes a header line as UTF-8.
fn utf8_line(raw: &[u8]) -> ParseResult<&str> {
    std::str::from_utf8(raw).map_err(|e| ParseError::InvalidUtf8(e.to_string()))
}

/// Parses a signed length field from a header line.
fn parse_length(raw: &[u8]) -> ParseResult<i64> {
    let s = utf8_line(raw)?;
    s.parse()
        .map_err(|_| ParseError::InvalidLength(s.to_string()))
}

/// Parses a single RESP message from bytes.
///
/// This is a convenience function for simple use cases.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}
