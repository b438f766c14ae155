//! Pub/sub
//!
//! SUBSCRIBE switches the connection into subscriber mode. From then on
//! the server pushes three-element multi-bulk replies:
//!
//! ```text
//! *3\r\n $9\r\nsubscribe\r\n $<n>\r\n<channel>\r\n :<count>\r\n   (confirmation)
//! *3\r\n $7\r\nmessage\r\n   $<n>\r\n<channel>\r\n $<n>\r\n<payload>\r\n
//! ```

use crate::error::{RespError, Result};
use crate::protocol::{command, Arg, ReplyKind};
use crate::transport::Transport;
use super::Client;

/// Longest push-kind label ("subscribe", "message", ...)
const KIND_CAPACITY: usize = 16;

/// Lengths of a received message, copied into the caller's buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub channel_len: usize,
    pub payload_len: usize,
}

impl<T: Transport> Client<T> {
    /// SUBSCRIBE channel; returns the number of active subscriptions
    ///
    /// Only `subscribe` and `next_message` are accepted afterwards, until the
    /// client disconnects.
    pub fn subscribe(&mut self, channel: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(&command::SUBSCRIBE, &[Arg::Text(channel.as_ref())])?;

        // Messages for earlier subscriptions can arrive ahead of the confirmation
        loop {
            let mut kind = [0u8; KIND_CAPACITY];
            let label = self.read_push_label(&mut kind)?;
            if label == b"subscribe" {
                break;
            }
            tracing::debug!(
                "Dropping {:?} push while waiting for a subscribe confirmation",
                String::from_utf8_lossy(label)
            );
            self.drain_elements(2)?;
            self.parser.reset();
        }

        self.next_element()?;
        self.skip_reply()?;
        self.next_element()?;
        let count = self.read_integer()?;

        tracing::debug!("Subscribed; {} active subscriptions", count);
        self.subscribed = true;
        Ok(count)
    }

    /// Wait for the next published message
    ///
    /// Channel and payload are copied into `channel` and `payload`. Other
    /// pushes (confirmations for further subscriptions) are skipped. The
    /// reply timeout applies to each wait. A timeout before any byte of a
    /// push arrives keeps the subscription, so the caller can simply call
    /// again.
    pub fn next_message(&mut self, channel: &mut [u8], payload: &mut [u8]) -> Result<Message> {
        if !self.subscribed {
            return Err(RespError::InvalidArgument(
                "next_message requires an active subscription".to_string(),
            ));
        }

        loop {
            self.parser.reset();
            match self.parser.classify(self.session.transport_mut()) {
                Err(e @ RespError::Timeout(_))
                    if self.parser.kind() == ReplyKind::NotYetClassified =>
                {
                    tracing::trace!("No push within the reply timeout");
                    return Err(e);
                }
                classified => {
                    self.settle(classified)?;
                }
            }

            let mut kind = [0u8; KIND_CAPACITY];
            let label = self.read_push_label(&mut kind)?;
            if label != b"message" {
                tracing::trace!("Skipping {:?} push", String::from_utf8_lossy(label));
                self.drain_elements(2)?;
                continue;
            }

            // Read both bulks even if the first does not fit, so the stream
            // stays aligned for the next push
            self.next_element()?;
            let channel_len = match self.read_bulk(channel) {
                Err(e) if e.desynchronizes() => return Err(e),
                other => other,
            };
            self.next_element()?;
            let payload_len = self.read_bulk(payload)?;
            let channel_len = channel_len?;

            return Ok(Message {
                channel_len: channel_len.unwrap_or(0),
                payload_len: payload_len.unwrap_or(0),
            });
        }
    }

    /// Read a push's element count and its first element, the kind label
    fn read_push_label<'a>(&mut self, dest: &'a mut [u8; KIND_CAPACITY]) -> Result<&'a [u8]> {
        let count = self.read_multi_bulk_count()?;
        if count != Some(3) {
            self.drain_elements(count.unwrap_or(0))?;
            return Err(RespError::Protocol(format!(
                "push with {:?} elements, expected 3",
                count
            )));
        }

        let kind = self.next_element()?;
        if kind != ReplyKind::Bulk {
            self.skip_reply()?;
            self.drain_elements(2)?;
            return Err(RespError::UnexpectedReply {
                expected: ReplyKind::Bulk,
                actual: kind,
            });
        }
        let len = match self.read_bulk(dest) {
            Ok(len) => len.unwrap_or(0),
            Err(e) if !e.desynchronizes() => {
                self.drain_elements(2)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        Ok(&dest[..len])
    }
}
