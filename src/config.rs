//! Configuration for RespLite
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{RespError, Result};
use crate::transport::Endpoint;

/// Smallest command buffer that still fits a one-argument frame header.
pub const MIN_BUFFER_CAPACITY: usize = 16;

/// Main configuration for a client instance
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Memory Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the single reusable command buffer (in bytes)
    pub buffer_capacity: usize,

    // -------------------------------------------------------------------------
    // Timing Configuration
    // -------------------------------------------------------------------------
    /// How long a reply may take before the read fails (milliseconds)
    pub reply_timeout_ms: u64,

    /// Sleep between polls of the transport while waiting (milliseconds)
    pub poll_interval_ms: u64,

    /// Connect timeout used by network transports (milliseconds)
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            buffer_capacity: 2048,
            reply_timeout_ms: 5000,
            poll_interval_ms: 1,
            connect_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// The endpoint commands are sent to
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Check the settings before a client is built from them
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(RespError::Config("host must not be empty".to_string()));
        }
        if self.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(RespError::Config(format!(
                "buffer_capacity must be at least {} bytes, got {}",
                MIN_BUFFER_CAPACITY, self.buffer_capacity
            )));
        }
        if self.reply_timeout_ms == 0 {
            return Err(RespError::Config(
                "reply_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(RespError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms > self.reply_timeout_ms {
            return Err(RespError::Config(format!(
                "poll_interval_ms ({}) exceeds reply_timeout_ms ({})",
                self.poll_interval_ms, self.reply_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the command buffer capacity (in bytes)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    /// Set the reply timeout (in milliseconds)
    pub fn reply_timeout_ms(mut self, ms: u64) -> Self {
        self.config.reply_timeout_ms = ms;
        self
    }

    /// Set the poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
