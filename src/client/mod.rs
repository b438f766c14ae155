//! Client Module
//!
//! Ties a `Session`, the command encoder and the reply parser together.
//!
//! ## Flow of one command
//! 1. connect lazily
//! 2. reset the buffer and encode the frame
//! 3. write the frame in one call
//! 4. classify the reply and check its kind against the command table
//! 5. decode the body into the caller's result
//!
//! Every method takes `&mut self`, so at most one command is ever in flight.
//! A failure that can leave the stream mid-reply (timeout, malformed
//! reply, closed connection) disconnects the session; the next command
//! reconnects.

mod commands;
mod pubsub;

use crate::config::ClientConfig;
use crate::error::{RespError, Result};
use crate::protocol::{
    command, Arg, CommandEncoder, CommandSpec, Numeric, ReplyKind, ReplyParser, WaitPolicy,
};
use crate::session::Session;
use crate::transport::{Endpoint, TcpTransport, Transport};

pub use commands::{ServerTime, Ttl};
pub use pubsub::Message;

/// Single-session client
pub struct Client<T: Transport = TcpTransport> {
    session: Session<T>,
    encoder: CommandEncoder,
    parser: ReplyParser,

    /// Set after SUBSCRIBE; only pub/sub traffic is valid until disconnect
    subscribed: bool,
}

impl Client<TcpTransport> {
    /// Create a TCP client; nothing is connected until the first command
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = TcpTransport::new(config.connect_timeout());
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over any transport
    pub fn with_transport(transport: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: Session::new(transport, config.endpoint()),
            encoder: CommandEncoder::new(config.buffer_capacity),
            parser: ReplyParser::new(WaitPolicy {
                timeout: config.reply_timeout(),
                poll_interval: config.poll_interval(),
            }),
            subscribed: false,
        })
    }

    // =========================================================================
    // Connection
    // =========================================================================

    pub fn connect(&mut self) -> Result<()> {
        self.session.connect()
    }

    /// Drop any current connection and connect to `endpoint`
    pub fn connect_to(&mut self, endpoint: Endpoint) -> Result<()> {
        self.subscribed = false;
        self.session.connect_to(endpoint)
    }

    pub fn disconnect(&mut self) {
        self.subscribed = false;
        self.session.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.session.endpoint()
    }

    pub fn transport(&self) -> &T {
        self.session.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.session.transport_mut()
    }

    // =========================================================================
    // Low-level command building
    // =========================================================================

    /// Begin a command of `arg_count` arguments (the name counts as one)
    pub fn start_command(&mut self, arg_count: usize) -> Result<()> {
        self.parser.reset();
        self.encoder.start_command(arg_count)
    }

    pub fn add_arg(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        self.encoder.add_arg(text.as_ref())
    }

    pub fn add_integer_arg(&mut self, value: i64) -> Result<()> {
        self.encoder.add_integer_arg(value)
    }

    pub fn add_float_arg(&mut self, value: f64) -> Result<()> {
        self.encoder.add_float_arg(value)
    }

    /// Write the finished frame
    ///
    /// Unread bytes left over from an earlier reply are discarded first. A
    /// frame is written at most once; sending again needs a new
    /// `start_command`.
    pub fn send(&mut self) -> Result<()> {
        let frame = self.encoder.frame()?;
        self.session.connect()?;
        self.parser.reset();

        let transport = self.session.transport_mut();
        let stale = transport.available()?;
        if stale > 0 && !self.subscribed {
            tracing::warn!("Discarding {} unread bytes before the next command", stale);
            for _ in 0..stale {
                transport.read_byte()?;
            }
        }

        tracing::trace!("Writing {} byte command", frame.len());
        let written = transport.write(frame);
        if written.is_ok() {
            self.encoder.mark_sent();
        }
        self.settle(written)
    }

    /// Encode, send and check the reply kind of a table command
    pub fn execute(&mut self, spec: &CommandSpec, args: &[Arg<'_>]) -> Result<()> {
        self.execute_parts(spec, args, &[])
    }

    /// `execute` with arguments split into leading ones and a tail
    pub fn execute_parts(
        &mut self,
        spec: &CommandSpec,
        head: &[Arg<'_>],
        tail: &[Arg<'_>],
    ) -> Result<()> {
        let arg_count = spec.check_parts(head, tail)?;
        if self.subscribed && *spec != command::SUBSCRIBE {
            return Err(RespError::InvalidArgument(format!(
                "{} is not allowed while subscribed",
                spec.name
            )));
        }

        self.session.connect()?;
        self.start_command(arg_count)?;
        self.encoder.add_arg(spec.name.as_bytes())?;
        for arg in head.iter().chain(tail) {
            self.encoder.add(*arg)?;
        }
        tracing::trace!("Executing {}", spec.name);
        self.send()?;

        let checked = self.parser.expect(self.session.transport_mut(), spec.reply);
        self.settle(checked)
    }

    /// Run a command by name, looking its shapes up in the command table
    pub fn execute_named(&mut self, name: &str, args: &[Arg<'_>]) -> Result<ReplyKind> {
        let spec = command::lookup(name)
            .ok_or_else(|| RespError::InvalidArgument(format!("unknown command {}", name)))?;
        self.execute(spec, args)?;
        Ok(spec.reply)
    }

    // =========================================================================
    // Low-level reply reading
    // =========================================================================

    /// Classify the pending reply (cached after the first call)
    pub fn reply_kind(&mut self) -> Result<ReplyKind> {
        let kind = self.parser.classify(self.session.transport_mut());
        self.settle(kind)
    }

    /// Read an integer reply that must fit an `i64`
    pub fn read_integer(&mut self) -> Result<i64> {
        self.expect(ReplyKind::Integer)?;
        let value = self.parser.read_integer(self.session.transport_mut());
        self.settle(value)
    }

    /// Read an integer reply of any width
    pub fn read_numeric(&mut self) -> Result<Numeric> {
        self.expect(ReplyKind::Integer)?;
        let value = self.parser.read_numeric(self.session.transport_mut());
        self.settle(value)
    }

    /// Read a status line into `dest`
    pub fn read_status(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.expect(ReplyKind::SingleLine)?;
        let len = self.parser.read_line(self.session.transport_mut(), dest);
        self.settle(len)
    }

    /// Read an error line into `dest`
    pub fn read_error(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.expect(ReplyKind::Error)?;
        let len = self.parser.read_line(self.session.transport_mut(), dest);
        self.settle(len)
    }

    /// Read a bulk string into `dest`; `None` for null
    pub fn read_bulk(&mut self, dest: &mut [u8]) -> Result<Option<usize>> {
        self.expect(ReplyKind::Bulk)?;
        let len = self.parser.read_bulk(self.session.transport_mut(), dest);
        self.settle(len)
    }

    /// Read a multi-bulk element count; `None` for the null array
    pub fn read_multi_bulk_count(&mut self) -> Result<Option<usize>> {
        self.expect(ReplyKind::MultiBulk)?;
        let count = self.parser.read_multi_bulk_count(self.session.transport_mut());
        self.settle(count)
    }

    /// Classify the next element of a multi-bulk reply
    pub fn next_element(&mut self) -> Result<ReplyKind> {
        let kind = self.parser.next_element(self.session.transport_mut());
        self.settle(kind)
    }

    /// Discard whatever remains of the current reply
    pub fn skip_reply(&mut self) -> Result<()> {
        let skipped = self.parser.skip_current(self.session.transport_mut());
        self.settle(skipped)
    }

    fn expect(&mut self, kind: ReplyKind) -> Result<()> {
        let checked = self.parser.expect(self.session.transport_mut(), kind);
        self.settle(checked)
    }

    /// Drop the session if `result` may have left the stream mid-reply
    fn settle<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(e) = &result {
            if e.desynchronizes() && self.session.is_connected() {
                tracing::warn!(
                    "Dropping session to {} after reply failure: {}",
                    self.session.endpoint(),
                    e
                );
                self.subscribed = false;
                self.session.disconnect();
            }
        }
        result
    }
}
