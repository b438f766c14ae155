//! Command encoder
//!
//! Builds one request frame into the command buffer:
//!
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg>\r\n      (argc times)
//! ```
//!
//! Arguments are appended one at a time, so a frame with any number of
//! arguments can be built without staging them anywhere else.

use std::io::Write;

use crate::error::{RespError, Result};
use super::buffer::CommandBuffer;

const CRLF: &[u8] = b"\r\n";

/// Room for the longest `{:.2}` rendering of a finite f64
const FLOAT_SCRATCH: usize = 320;

/// A typed command argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Text(&'a [u8]),
    Integer(i64),
    Float(f64),
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Arg::Text(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Arg::Text(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Text(value.as_bytes())
    }
}

impl From<i64> for Arg<'_> {
    fn from(value: i64) -> Self {
        Arg::Integer(value)
    }
}

impl From<f64> for Arg<'_> {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

/// Frame builder over a bounded buffer
#[derive(Debug)]
pub struct CommandEncoder {
    buffer: CommandBuffer,
    declared: usize,
    appended: usize,
    failed: bool,
}

impl CommandEncoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: CommandBuffer::with_capacity(capacity),
            declared: 0,
            appended: 0,
            failed: false,
        }
    }

    /// Reset the buffer and write the `*<argc>\r\n` header
    pub fn start_command(&mut self, arg_count: usize) -> Result<()> {
        self.buffer.reset();
        self.declared = arg_count;
        self.appended = 0;
        self.failed = false;

        let mut digits = [0u8; 20];
        let count = render_unsigned(arg_count as u64, &mut digits);
        let header = self.buffer.append(&[b"*", count, CRLF]);
        self.failed = header.is_err();
        header
    }

    /// Append `$<len>\r\n<text>\r\n`
    pub fn add_arg(&mut self, text: &[u8]) -> Result<()> {
        self.check_room_for_arg()?;

        let mut digits = [0u8; 20];
        let len = render_unsigned(text.len() as u64, &mut digits);
        match self.buffer.append(&[b"$", len, CRLF, text, CRLF]) {
            Ok(()) => {
                self.appended += 1;
                Ok(())
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    /// Append an integer in decimal
    pub fn add_integer_arg(&mut self, value: i64) -> Result<()> {
        let mut digits = [0u8; 20];
        let text = render_signed(value, &mut digits);
        self.add_arg(text)
    }

    /// Append a float with two decimals and no padding
    pub fn add_float_arg(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            self.failed = true;
            return Err(RespError::InvalidArgument(format!(
                "float argument must be finite, got {}",
                value
            )));
        }

        let mut scratch = [0u8; FLOAT_SCRATCH];
        let written = {
            let mut cursor = &mut scratch[..];
            write!(cursor, "{:6.2}", value).map_err(|_| {
                RespError::InvalidArgument(format!("float argument {} does not render", value))
            })?;
            FLOAT_SCRATCH - cursor.len()
        };
        let text = &scratch[..written];
        let start = text.iter().position(|&b| b != b' ').unwrap_or(text.len());
        self.add_arg(&text[start..])
    }

    /// Append any typed argument
    pub fn add(&mut self, arg: Arg<'_>) -> Result<()> {
        match arg {
            Arg::Text(text) => self.add_arg(text),
            Arg::Integer(value) => self.add_integer_arg(value),
            Arg::Float(value) => self.add_float_arg(value),
        }
    }

    /// The finished frame
    ///
    /// Fails unless every declared argument was appended successfully, so a
    /// partial frame can never reach the transport.
    pub fn frame(&self) -> Result<&[u8]> {
        if self.failed || self.appended != self.declared || self.buffer.is_empty() {
            return Err(RespError::IncompleteCommand {
                declared: self.declared,
                appended: self.appended,
            });
        }
        Ok(self.buffer.as_bytes())
    }

    /// Drop the frame once it is on the wire; `frame` fails until the next
    /// `start_command`
    pub fn mark_sent(&mut self) {
        self.buffer.reset();
        self.appended = 0;
        self.failed = true;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn check_room_for_arg(&mut self) -> Result<()> {
        if self.failed {
            return Err(RespError::InvalidArgument(
                "command was already sent or abandoned; start a new one".to_string(),
            ));
        }
        if self.appended >= self.declared {
            self.failed = true;
            return Err(RespError::InvalidArgument(format!(
                "command declared {} arguments",
                self.declared
            )));
        }
        Ok(())
    }
}

/// Render `value` into the tail of `scratch`, returning the digits
pub(crate) fn render_unsigned(mut value: u64, scratch: &mut [u8; 20]) -> &[u8] {
    let mut pos = scratch.len();
    loop {
        pos -= 1;
        scratch[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &scratch[pos..]
}

/// Signed variant of `render_unsigned`; i64::MIN fits in 20 bytes
pub(crate) fn render_signed(value: i64, scratch: &mut [u8; 20]) -> &[u8] {
    let magnitude = value.unsigned_abs();
    let digits = render_unsigned(magnitude, scratch).len();
    let mut start = scratch.len() - digits;
    if value < 0 {
        start -= 1;
        scratch[start] = b'-';
    }
    &scratch[start..]
}
