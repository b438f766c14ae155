//! TCP Transport
//!
//! `std::net::TcpStream` behind the `Transport` trait.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Buf, BytesMut};

use crate::error::{RespError, Result};
use super::{Endpoint, Transport};

/// Bytes pulled from the socket per non-blocking read
const READ_CHUNK: usize = 512;

/// TCP transport with a small receive buffer
pub struct TcpTransport {
    /// Open stream, if any
    stream: Option<TcpStream>,

    /// Bytes read from the socket but not yet consumed
    rx: BytesMut,

    /// Connect timeout per resolved address
    connect_timeout: Duration,

    /// Set once the peer has closed its side
    peer_closed: bool,
}

impl TcpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            stream: None,
            rx: BytesMut::with_capacity(READ_CHUNK),
            connect_timeout,
            peer_closed: false,
        }
    }

    /// Move everything the socket has ready into the receive buffer
    fn fill(&mut self) -> Result<()> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(()),
        };

        stream.set_nonblocking(true)?;
        let mut chunk = [0u8; READ_CHUNK];
        let outcome = loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    self.peer_closed = true;
                    break Ok(());
                }
                Ok(n) => self.rx.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        stream.set_nonblocking(false)?;

        outcome.map_err(RespError::from)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Transport for TcpTransport {
    fn open(&mut self, endpoint: &Endpoint) -> Result<()> {
        self.close();

        let addrs = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    // Disable Nagle's algorithm; every frame is written in one shot
                    stream.set_nodelay(true)?;
                    tracing::debug!("TCP transport connected to {}", addr);
                    self.stream = Some(stream);
                    self.peer_closed = false;
                    return Ok(());
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(RespError::Connect {
            endpoint: endpoint.to_string(),
            reason: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string()),
        })
    }

    fn is_open(&self) -> bool {
        self.stream.is_some() && !self.peer_closed
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.rx.clear();
        self.peer_closed = false;
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(RespError::NotConnected)?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        if self.stream.is_none() {
            return Err(RespError::NotConnected);
        }
        if !self.peer_closed {
            self.fill()?;
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        if self.rx.has_remaining() {
            Ok(self.rx.get_u8())
        } else if self.stream.is_none() {
            Err(RespError::NotConnected)
        } else if self.peer_closed {
            Err(RespError::ConnectionClosed)
        } else {
            Err(RespError::Io(ErrorKind::WouldBlock.into()))
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}
