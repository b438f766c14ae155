//! Command buffer
//!
//! A fixed-capacity byte buffer. It is allocated once and reused for every
//! command; appends past capacity fail instead of growing.

use bytes::BytesMut;

use crate::error::{RespError, Result};

/// Bounded, reusable byte buffer
#[derive(Debug)]
pub struct CommandBuffer {
    bytes: BytesMut,
    capacity: usize,
}

impl CommandBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop the contents, keeping the allocation
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Append all of `parts`, or nothing if they do not fit
    pub fn append(&mut self, parts: &[&[u8]]) -> Result<()> {
        let needed = self.bytes.len() + parts.iter().map(|p| p.len()).sum::<usize>();
        if needed > self.capacity {
            return Err(RespError::CommandTooLarge {
                needed,
                capacity: self.capacity,
            });
        }
        for part in parts {
            self.bytes.extend_from_slice(part);
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }
}
