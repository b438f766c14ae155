//! Reply definitions
//!
//! Reply classification and the tagged numeric result.

use std::fmt;

/// Classification of a reply by its first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    /// A command was sent but its reply has not been looked at yet
    NotYetClassified,
    /// `+<text>\r\n`
    SingleLine,
    /// `-<text>\r\n`
    Error,
    /// `:<digits>\r\n`
    Integer,
    /// `$<len>\r\n<bytes>\r\n`
    Bulk,
    /// `*<count>\r\n` followed by `count` replies
    MultiBulk,
    /// The reply has been fully consumed
    None,
}

impl ReplyKind {
    /// Map a reply's first byte to its kind
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(ReplyKind::SingleLine),
            b'-' => Some(ReplyKind::Error),
            b':' => Some(ReplyKind::Integer),
            b'$' => Some(ReplyKind::Bulk),
            b'*' => Some(ReplyKind::MultiBulk),
            _ => None,
        }
    }

    /// The first byte that introduces this kind, if it has one
    pub fn marker(self) -> Option<u8> {
        match self {
            ReplyKind::SingleLine => Some(b'+'),
            ReplyKind::Error => Some(b'-'),
            ReplyKind::Integer => Some(b':'),
            ReplyKind::Bulk => Some(b'$'),
            ReplyKind::MultiBulk => Some(b'*'),
            ReplyKind::NotYetClassified | ReplyKind::None => None,
        }
    }
}

/// Capacity of the inline text kept for out-of-range integers
pub const NUMERIC_TEXT_CAPACITY: usize = 64;

/// Verbatim digits of an integer reply, stored inline
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NumericText {
    bytes: [u8; NUMERIC_TEXT_CAPACITY],
    len: usize,
}

impl NumericText {
    /// Copy `digits`, or `None` if they exceed the inline capacity
    pub fn new(digits: &[u8]) -> Option<Self> {
        if digits.len() > NUMERIC_TEXT_CAPACITY {
            return None;
        }
        let mut bytes = [0u8; NUMERIC_TEXT_CAPACITY];
        bytes[..digits.len()].copy_from_slice(digits);
        Some(Self {
            bytes,
            len: digits.len(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII digits and a leading '-' are ever stored
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl fmt::Debug for NumericText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NumericText").field(&self.as_str()).finish()
    }
}

impl fmt::Display for NumericText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer reply
///
/// Store integers can be wider than `i64`. Those arrive as `Raw`, holding the
/// reply's digits untouched so nothing is silently wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
    Exact(i64),
    Raw(NumericText),
}

impl Numeric {
    /// The value, if it fits in an `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Exact(value) => Some(*value),
            Numeric::Raw(_) => None,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Exact(value) => write!(f, "{}", value),
            Numeric::Raw(text) => write!(f, "{}", text),
        }
    }
}
