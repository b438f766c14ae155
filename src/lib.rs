//! # RespLite
//!
//! A minimal client for RESP key-value stores, built for tight memory:
//! - One reusable, capacity-bounded command buffer per client
//! - Replies decoded straight into caller-provided buffers
//! - One command in flight at a time, no pipelining
//! - Every wait bounded by a configurable reply timeout
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Client (command façade)                   │
//! │          declarative command table → typed results           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────────┐
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐   ┌─────────────┐
//!   │   Session   │ │   Encoder   │   │   Parser    │
//!   │ (lazy conn) │ │ (bounded)   │   │ (classify   │
//!   └──────┬──────┘ └──────┬──────┘   │  once)      │
//!          │               │          └──────┬──────┘
//!          ▼               ▼                 │
//!   ┌─────────────────────────────────────────▼───────┐
//!   │                   Transport                      │
//!   │        (TcpTransport / ScriptedTransport)        │
//!   └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use resplite::{Client, ClientConfig};
//!
//! let mut client = Client::new(ClientConfig::default())?;
//! client.set("greeting", "hello")?;
//!
//! let mut value = [0u8; 32];
//! if let Some(len) = client.get("greeting", &mut value)? {
//!     assert_eq!(&value[..len], b"hello");
//! }
//! # Ok::<(), resplite::RespError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod transport;
pub mod protocol;
pub mod session;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RespError, Result};
pub use config::ClientConfig;
pub use client::{Client, Message, ServerTime, Ttl};
pub use protocol::{Arg, Numeric, ReplyKind};
pub use transport::{Endpoint, ScriptedTransport, TcpTransport, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RespLite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
