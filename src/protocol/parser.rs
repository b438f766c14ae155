//! Reply parser
//!
//! Decodes one reply straight off a `Transport`, a byte at a time, into
//! caller-provided buffers.
//!
//! ## State
//! - `ReplyKind::NotYetClassified` after a new command starts
//! - the reply's kind once its first byte has been read (read exactly once)
//! - `ReplyKind::None` once the reply body, terminator included, is consumed
//!
//! ## Waiting
//! Reads that need bytes the transport does not have yet poll
//! `Transport::available` and sleep between polls. The whole reply shares
//! one deadline, armed by the first wait after `reset`; missing it fails
//! with `RespError::Timeout`.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{RespError, Result};
use crate::transport::Transport;
use super::reply::{Numeric, NumericText, ReplyKind, NUMERIC_TEXT_CAPACITY};

/// Longest server error message kept when surfacing `RespError::Server`
const ERROR_MESSAGE_CAPACITY: usize = 256;

/// How long to wait for reply bytes, and how often to look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// Decoder for one reply at a time
#[derive(Debug)]
pub struct ReplyParser {
    kind: ReplyKind,
    wait: WaitPolicy,
    deadline: Option<Instant>,
}

impl ReplyParser {
    pub fn new(wait: WaitPolicy) -> Self {
        Self {
            kind: ReplyKind::None,
            wait,
            deadline: None,
        }
    }

    /// Forget the previous reply; the next `classify` reads a fresh one
    pub fn reset(&mut self) {
        self.kind = ReplyKind::NotYetClassified;
        self.deadline = None;
    }

    /// The cached classification
    pub fn kind(&self) -> ReplyKind {
        self.kind
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// Classify the current reply by its first byte
    ///
    /// Only the first call after `reset` reads from the transport; later
    /// calls return the cached kind.
    pub fn classify<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<ReplyKind> {
        if self.kind != ReplyKind::NotYetClassified {
            return Ok(self.kind);
        }

        let marker = self.next_byte(transport)?;
        let kind = ReplyKind::from_marker(marker).ok_or_else(|| {
            RespError::Protocol(format!("unknown reply marker 0x{:02x}", marker))
        })?;
        tracing::trace!("Classified reply as {:?}", kind);
        self.kind = kind;
        Ok(kind)
    }

    /// Move on to the next element of a multi-bulk reply and classify it
    pub fn next_element<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<ReplyKind> {
        self.kind = ReplyKind::NotYetClassified;
        self.classify(transport)
    }

    /// Classify and require `expected`
    ///
    /// An error reply is read and returned as `RespError::Server`. Any other
    /// mismatch is drained before `RespError::UnexpectedReply` is returned,
    /// so the stream stays aligned for the next command.
    pub fn expect<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        expected: ReplyKind,
    ) -> Result<()> {
        let actual = self.classify(transport)?;
        if actual == expected {
            return Ok(());
        }

        if actual == ReplyKind::Error {
            let mut message = [0u8; ERROR_MESSAGE_CAPACITY];
            let (stored, _) = self.line_into(transport, &mut message)?;
            return Err(RespError::Server(
                String::from_utf8_lossy(&message[..stored]).into_owned(),
            ));
        }

        self.skip_current(transport)?;
        Err(RespError::UnexpectedReply { expected, actual })
    }

    // =========================================================================
    // Body readers (call after classification)
    // =========================================================================

    /// Read a `\r\n` terminated decimal that must fit an `i64`
    pub fn read_integer<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<i64> {
        let mut digits = [0u8; NUMERIC_TEXT_CAPACITY];
        let len = self.digits_into(transport, &mut digits)?;
        parse_i64(&digits[..len]).ok_or_else(|| {
            RespError::OutOfRange(format!(
                "{} does not fit in i64",
                String::from_utf8_lossy(&digits[..len])
            ))
        })
    }

    /// Read a `\r\n` terminated decimal, keeping the text if it is too wide
    pub fn read_numeric<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Numeric> {
        let mut digits = [0u8; NUMERIC_TEXT_CAPACITY];
        let len = self.digits_into(transport, &mut digits)?;
        match parse_i64(&digits[..len]) {
            Some(value) => Ok(Numeric::Exact(value)),
            None => NumericText::new(&digits[..len])
                .map(Numeric::Raw)
                .ok_or_else(|| RespError::OutOfRange("integer reply too long".to_string())),
        }
    }

    /// Read a status or error line into `dest`, returning its length
    pub fn read_line<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        dest: &mut [u8],
    ) -> Result<usize> {
        let (stored, total) = self.line_into(transport, dest)?;
        if total > stored {
            return Err(RespError::DestinationTooSmall {
                needed: total,
                capacity: dest.len(),
            });
        }
        Ok(stored)
    }

    /// Read a bulk string into `dest`
    ///
    /// Returns `None` for the null bulk string. A payload longer than `dest`
    /// is discarded without touching `dest` and reported as
    /// `RespError::DestinationTooSmall`.
    pub fn read_bulk<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        dest: &mut [u8],
    ) -> Result<Option<usize>> {
        match self.bulk_into(transport, dest)? {
            Some(len) if len > dest.len() => Err(RespError::DestinationTooSmall {
                needed: len,
                capacity: dest.len(),
            }),
            other => Ok(other),
        }
    }

    /// Read a multi-bulk element count; `None` for the null array
    ///
    /// The elements themselves are left on the stream, see `next_element`.
    pub fn read_multi_bulk_count<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<usize>> {
        self.read_length(transport)
    }

    /// Discard the rest of the current reply, nested elements included
    pub fn skip_current<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        match self.kind {
            ReplyKind::SingleLine | ReplyKind::Error => {
                self.line_into(transport, &mut [])?;
            }
            ReplyKind::Integer => {
                self.read_numeric(transport)?;
            }
            ReplyKind::Bulk => {
                self.bulk_into(transport, &mut [])?;
            }
            ReplyKind::MultiBulk => {
                let count = self.read_length(transport)?.unwrap_or(0);
                for _ in 0..count {
                    self.next_element(transport)?;
                    self.skip_current(transport)?;
                }
            }
            ReplyKind::NotYetClassified | ReplyKind::None => {}
        }
        self.kind = ReplyKind::None;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// A length header; anything that is not a usable length is a protocol
    /// error, since the payload it announces is still on the stream
    fn read_length<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Option<usize>> {
        let len = self.read_integer(transport).map_err(|e| match e {
            RespError::OutOfRange(reason) => RespError::Protocol(reason),
            other => other,
        })?;
        match len {
            -1 => Ok(None),
            len if len < 0 => Err(RespError::Protocol(format!("negative length {}", len))),
            len => usize::try_from(len)
                .map(Some)
                .map_err(|_| RespError::Protocol(format!("length {} exceeds usize", len))),
        }
    }

    /// Bulk payload length; the payload is copied only if it fits `dest`
    fn bulk_into<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        dest: &mut [u8],
    ) -> Result<Option<usize>> {
        let len = match self.read_length(transport)? {
            Some(len) => len,
            None => return Ok(None),
        };

        self.wait_for(transport, len + 2)?;
        let fits = len <= dest.len();
        for idx in 0..len {
            let byte = transport.read_byte()?;
            if fits {
                dest[idx] = byte;
            }
        }
        self.expect_crlf(transport)?;
        self.kind = ReplyKind::None;
        Ok(Some(len))
    }

    /// Printable bytes up to `\r\n`; returns (stored, total line length)
    fn line_into<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        dest: &mut [u8],
    ) -> Result<(usize, usize)> {
        let mut stored = 0;
        let mut total = 0;
        loop {
            match self.next_byte(transport)? {
                b'\r' => {
                    self.expect_lf(transport)?;
                    break;
                }
                byte @ 32..=126 => {
                    if stored < dest.len() {
                        dest[stored] = byte;
                        stored += 1;
                    }
                    total += 1;
                }
                _ => {}
            }
        }
        self.kind = ReplyKind::None;
        Ok((stored, total))
    }

    /// A decimal line: one optional leading '-', then at least one digit
    fn digits_into<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        dest: &mut [u8; NUMERIC_TEXT_CAPACITY],
    ) -> Result<usize> {
        let mut len = 0;
        loop {
            let byte = self.next_byte(transport)?;
            match byte {
                b'0'..=b'9' => {}
                b'-' if len == 0 => {}
                b'-' => {
                    return Err(RespError::Protocol(
                        "sign after the start of an integer".to_string(),
                    ))
                }
                b'\r' => {
                    self.expect_lf(transport)?;
                    break;
                }
                other => {
                    return Err(RespError::Protocol(format!(
                        "unexpected byte 0x{:02x} in integer",
                        other
                    )))
                }
            }
            if len == dest.len() {
                // The rest of the line is still unread
                return Err(RespError::Protocol(format!(
                    "integer reply longer than {} bytes",
                    NUMERIC_TEXT_CAPACITY
                )));
            }
            dest[len] = byte;
            len += 1;
        }

        if len == 0 || dest[..len] == *b"-" {
            return Err(RespError::Protocol("integer without digits".to_string()));
        }
        self.kind = ReplyKind::None;
        Ok(len)
    }

    fn expect_crlf<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        match self.next_byte(transport)? {
            b'\r' => self.expect_lf(transport),
            other => Err(RespError::Protocol(format!(
                "expected CR, found 0x{:02x}",
                other
            ))),
        }
    }

    fn expect_lf<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        match self.next_byte(transport)? {
            b'\n' => Ok(()),
            other => Err(RespError::Protocol(format!(
                "expected LF after CR, found 0x{:02x}",
                other
            ))),
        }
    }

    fn next_byte<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<u8> {
        self.wait_for(transport, 1)?;
        transport.read_byte()
    }

    /// Poll until `needed` bytes are available or the deadline passes
    fn wait_for<T: Transport + ?Sized>(&mut self, transport: &mut T, needed: usize) -> Result<()> {
        let timeout = self.wait.timeout;
        let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + timeout);
        loop {
            if transport.available()? >= needed {
                return Ok(());
            }
            if !transport.is_open() {
                return Err(RespError::ConnectionClosed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(RespError::Timeout(timeout));
            }
            thread::sleep(self.wait.poll_interval.min(deadline - now));
        }
    }
}

/// Parse validated decimal text; `None` on overflow
fn parse_i64(digits: &[u8]) -> Option<i64> {
    let (negative, body) = match digits.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, digits),
    };

    // Accumulate negatively so i64::MIN parses
    let mut value: i64 = 0;
    for &b in body {
        value = value.checked_mul(10)?.checked_sub((b - b'0') as i64)?;
    }
    if negative {
        Some(value)
    } else {
        value.checked_neg()
    }
}
