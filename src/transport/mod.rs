//! Transport Module
//!
//! The byte-stream abstraction the protocol engine runs on.
//!
//! ## Contract
//! - `open` connects to an endpoint; `close` drops the channel
//! - `write` delivers a whole frame or fails
//! - `available` reports how many bytes can be read without blocking
//! - `read_byte` pops one of those bytes
//!
//! The engine never blocks inside a transport call: it polls `available`
//! and sleeps between polls, so a transport only has to be non-blocking on
//! the read side.

mod scripted;
mod tcp;

use std::fmt;

use crate::error::Result;

pub use scripted::ScriptedTransport;
pub use tcp::TcpTransport;

/// Address of a store server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A byte transport to a store server
pub trait Transport {
    /// Open a channel to the endpoint
    fn open(&mut self, endpoint: &Endpoint) -> Result<()>;

    /// Whether the channel is currently open
    fn is_open(&self) -> bool;

    /// Close the channel; a no-op if it is not open
    fn close(&mut self);

    /// Write a complete frame
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of bytes readable right now
    fn available(&mut self) -> Result<usize>;

    /// Read one byte; fails if none is available
    fn read_byte(&mut self) -> Result<u8>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, endpoint: &Endpoint) -> Result<()> {
        (**self).open(endpoint)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }
}
