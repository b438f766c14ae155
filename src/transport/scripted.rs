//! Scripted Transport
//!
//! In-memory transport that answers each written frame with the next
//! scripted reply. Useful for exercising protocol code without a server.

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};

use crate::error::{RespError, Result};
use super::{Endpoint, Transport};

/// Transport backed by a queue of canned replies
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    /// Replies released one per written frame
    replies: VecDeque<Vec<u8>>,

    /// Bytes currently readable
    rx: BytesMut,

    /// Every frame written, in order
    written: Vec<Vec<u8>>,

    /// Endpoints passed to `open`, in order
    opened: Vec<Endpoint>,

    open: bool,
    refuse_open: bool,
    closes: usize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies, one released per written frame
    pub fn with_replies<I, B>(replies: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut transport = Self::new();
        for reply in replies {
            transport.push_reply(reply);
        }
        transport
    }

    /// Queue one reply for the next written frame
    pub fn push_reply(&mut self, reply: impl AsRef<[u8]>) {
        self.replies.push_back(reply.as_ref().to_vec());
    }

    /// Make bytes readable now, without waiting for a write
    pub fn push_unsolicited(&mut self, bytes: impl AsRef<[u8]>) {
        self.rx.extend_from_slice(bytes.as_ref());
    }

    /// Make every subsequent `open` fail
    pub fn refuse_connections(&mut self, refuse: bool) {
        self.refuse_open = refuse;
    }

    /// Simulate the peer dropping the connection
    pub fn drop_connection(&mut self) {
        self.open = false;
    }

    /// Frames written so far
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// The most recently written frame
    pub fn last_written(&self) -> Option<&[u8]> {
        self.written.last().map(|frame| frame.as_slice())
    }

    /// Endpoints `open` was called with
    pub fn opened(&self) -> &[Endpoint] {
        &self.opened
    }

    /// Number of times an open channel was closed
    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Bytes readable but not yet consumed
    pub fn unread(&self) -> &[u8] {
        &self.rx
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self, endpoint: &Endpoint) -> Result<()> {
        self.opened.push(endpoint.clone());
        if self.refuse_open {
            return Err(RespError::Connect {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if self.open {
            self.closes += 1;
        }
        self.open = false;
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open {
            return Err(RespError::NotConnected);
        }
        self.written.push(bytes.to_vec());
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend_from_slice(&reply);
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.rx.has_remaining() {
            Ok(self.rx.get_u8())
        } else {
            Err(RespError::Protocol("read with no bytes available".to_string()))
        }
    }
}
