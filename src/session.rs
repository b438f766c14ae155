//! Session Module
//!
//! Tracks whether a logical session is established over a transport.
//!
//! ## Responsibilities
//! - Remember the endpoint to connect to
//! - Connect lazily and idempotently
//! - Close the transport on disconnect
//!
//! Nothing here retries: a failed connect is reported and the caller decides
//! what to do next.

use crate::error::Result;
use crate::transport::{Endpoint, Transport};

/// Connection state over one transport
pub struct Session<T: Transport> {
    /// The byte transport
    transport: T,

    /// Where `connect` goes
    endpoint: Endpoint,

    /// Whether `connect` has succeeded since the last disconnect
    connected: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            connected: false,
        }
    }

    /// Connect to the remembered endpoint; Ok immediately if already connected
    pub fn connect(&mut self) -> Result<()> {
        if self.connected {
            if self.transport.is_open() {
                return Ok(());
            }
            tracing::debug!("Transport to {} closed underneath the session", self.endpoint);
            self.disconnect();
        }

        if let Err(e) = self.transport.open(&self.endpoint) {
            tracing::debug!("Connect to {} failed: {}", self.endpoint, e);
            self.transport.close();
            return Err(e);
        }

        tracing::debug!("Session connected to {}", self.endpoint);
        self.connected = true;
        Ok(())
    }

    /// Disconnect, switch to `endpoint`, then connect
    pub fn connect_to(&mut self, endpoint: Endpoint) -> Result<()> {
        self.disconnect();
        self.endpoint = endpoint;
        self.connect()
    }

    /// Close the transport; a no-op when not connected
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.transport.close();
        tracing::debug!("Session disconnected from {}", self.endpoint);
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
