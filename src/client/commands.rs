//! Command façade
//!
//! One method per table entry in `protocol::command`. Each method passes its
//! arguments to `Client::execute` and maps the checked reply to a typed
//! result:
//!
//! - integer counters return `Numeric`, so values wider than `i64` survive
//! - integer flags (0/1) return `bool`
//! - status replies return `()`
//! - bulk replies are copied into a caller buffer and return the length

use std::time::Duration;

use crate::error::{RespError, Result};
use crate::protocol::{command, Arg, CommandSpec, Numeric, ReplyKind};
use crate::transport::Transport;
use super::Client;

/// Scratch for the numeric bulk strings TIME replies with
const TIME_FIELD_CAPACITY: usize = 32;

/// TTL state of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key is missing or already expired
    Missing,
    /// Key exists without expiration
    NoExpiry,
    /// Key expires after the provided duration
    ExpiresIn(Duration),
}

/// Server clock as reported by TIME
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTime {
    /// Seconds since the UNIX epoch
    pub seconds: u64,
    /// Microseconds elapsed in the current second
    pub micros: u32,
}

impl ServerTime {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds) + Duration::from_micros(self.micros as u64)
    }
}

impl<T: Transport> Client<T> {
    // =========================================================================
    // Server
    // =========================================================================

    /// PING; succeeds on a status reply
    pub fn ping(&mut self) -> Result<()> {
        self.execute(&command::PING, &[])?;
        self.skip_reply()
    }

    /// TIME
    pub fn time(&mut self) -> Result<ServerTime> {
        self.execute(&command::TIME, &[])?;
        let count = self.read_multi_bulk_count()?;
        if count != Some(2) {
            self.drain_elements(count.unwrap_or(0))?;
            return Err(RespError::Protocol(format!(
                "TIME replied with {:?} elements, expected 2",
                count
            )));
        }

        let seconds = self.read_decimal_element()?;
        let micros = self.read_decimal_element()?;
        let micros = u32::try_from(micros)
            .map_err(|_| RespError::OutOfRange(format!("{} microseconds", micros)))?;
        Ok(ServerTime { seconds, micros })
    }

    // =========================================================================
    // Strings and counters
    // =========================================================================

    /// SET key value
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        self.execute(
            &command::SET,
            &[Arg::Text(key.as_ref()), Arg::Text(value.as_ref())],
        )?;
        self.skip_reply()
    }

    /// GET key into `dest`; `None` when the key is missing
    pub fn get(&mut self, key: impl AsRef<[u8]>, dest: &mut [u8]) -> Result<Option<usize>> {
        self.execute(&command::GET, &[Arg::Text(key.as_ref())])?;
        self.read_bulk(dest)
    }

    /// APPEND key value; returns the new length of the string
    pub fn append(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(
            &command::APPEND,
            &[Arg::Text(key.as_ref()), Arg::Text(value.as_ref())],
        )?;
        self.read_integer()
    }

    /// INCR key
    pub fn incr(&mut self, key: impl AsRef<[u8]>) -> Result<Numeric> {
        self.execute(&command::INCR, &[Arg::Text(key.as_ref())])?;
        self.read_numeric()
    }

    /// DECR key
    pub fn decr(&mut self, key: impl AsRef<[u8]>) -> Result<Numeric> {
        self.execute(&command::DECR, &[Arg::Text(key.as_ref())])?;
        self.read_numeric()
    }

    /// INCRBY key by
    pub fn incr_by(&mut self, key: impl AsRef<[u8]>, by: i64) -> Result<Numeric> {
        self.execute(&command::INCRBY, &[Arg::Text(key.as_ref()), Arg::Integer(by)])?;
        self.read_numeric()
    }

    /// DECRBY key by
    pub fn decr_by(&mut self, key: impl AsRef<[u8]>, by: i64) -> Result<Numeric> {
        self.execute(&command::DECRBY, &[Arg::Text(key.as_ref()), Arg::Integer(by)])?;
        self.read_numeric()
    }

    /// INCRBYFLOAT key by; the new value is written to `dest` as text
    pub fn incr_by_float(
        &mut self,
        key: impl AsRef<[u8]>,
        by: f64,
        dest: &mut [u8],
    ) -> Result<usize> {
        self.execute(&command::INCRBYFLOAT, &[Arg::Text(key.as_ref()), Arg::Float(by)])?;
        self.read_bulk(dest)?
            .ok_or_else(|| RespError::Protocol("INCRBYFLOAT replied with null".to_string()))
    }

    // =========================================================================
    // Keyspace
    // =========================================================================

    /// EXISTS key
    pub fn exists(&mut self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(&command::EXISTS, &[Arg::Text(key.as_ref())])?;
        self.read_flag()
    }

    /// DEL key; true when a key was removed
    pub fn del(&mut self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(&command::DEL, &[Arg::Text(key.as_ref())])?;
        self.read_flag()
    }

    /// PERSIST key; true when an expiry was removed
    pub fn persist(&mut self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(&command::PERSIST, &[Arg::Text(key.as_ref())])?;
        self.read_flag()
    }

    /// EXPIRE key seconds; true when the timeout was set
    pub fn expire(&mut self, key: impl AsRef<[u8]>, seconds: i64) -> Result<bool> {
        self.execute(&command::EXPIRE, &[Arg::Text(key.as_ref()), Arg::Integer(seconds)])?;
        self.read_flag()
    }

    /// TTL key
    pub fn ttl(&mut self, key: impl AsRef<[u8]>) -> Result<Ttl> {
        self.execute(&command::TTL, &[Arg::Text(key.as_ref())])?;
        match self.read_integer()? {
            -2 => Ok(Ttl::Missing),
            -1 => Ok(Ttl::NoExpiry),
            seconds if seconds >= 0 => Ok(Ttl::ExpiresIn(Duration::from_secs(seconds as u64))),
            other => Err(RespError::Protocol(format!("TTL replied with {}", other))),
        }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// RPUSH key value [value ...]; returns the list length
    pub fn rpush(&mut self, key: impl AsRef<[u8]>, values: &[Arg<'_>]) -> Result<i64> {
        self.push(&command::RPUSH, key.as_ref(), values)
    }

    /// LPUSH key value [value ...]; returns the list length
    pub fn lpush(&mut self, key: impl AsRef<[u8]>, values: &[Arg<'_>]) -> Result<i64> {
        self.push(&command::LPUSH, key.as_ref(), values)
    }

    /// LPOP key into `dest`; `None` when the list is empty
    pub fn lpop(&mut self, key: impl AsRef<[u8]>, dest: &mut [u8]) -> Result<Option<usize>> {
        self.execute(&command::LPOP, &[Arg::Text(key.as_ref())])?;
        self.read_bulk(dest)
    }

    /// LSET key index value
    pub fn lset(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.execute(
            &command::LSET,
            &[
                Arg::Text(key.as_ref()),
                Arg::Integer(index),
                Arg::Text(value.as_ref()),
            ],
        )?;
        self.skip_reply()
    }

    /// LTRIM key start stop
    pub fn ltrim(&mut self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Result<()> {
        self.execute(
            &command::LTRIM,
            &[Arg::Text(key.as_ref()), Arg::Integer(start), Arg::Integer(stop)],
        )?;
        self.skip_reply()
    }

    /// LINDEX key index into `dest`; `None` when out of range
    pub fn lindex(
        &mut self,
        key: impl AsRef<[u8]>,
        index: i64,
        dest: &mut [u8],
    ) -> Result<Option<usize>> {
        self.execute(&command::LINDEX, &[Arg::Text(key.as_ref()), Arg::Integer(index)])?;
        self.read_bulk(dest)
    }

    /// LLEN key
    pub fn llen(&mut self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.execute(&command::LLEN, &[Arg::Text(key.as_ref())])?;
        self.read_integer()
    }

    // =========================================================================
    // Hashes
    // =========================================================================

    /// HGET key field into `dest`; `None` when the field is missing
    pub fn hget(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        dest: &mut [u8],
    ) -> Result<Option<usize>> {
        self.execute(
            &command::HGET,
            &[Arg::Text(key.as_ref()), Arg::Text(field.as_ref())],
        )?;
        self.read_bulk(dest)
    }

    /// HSET key field value; true when the field is new
    pub fn hset(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bool> {
        self.execute(
            &command::HSET,
            &[
                Arg::Text(key.as_ref()),
                Arg::Text(field.as_ref()),
                Arg::Text(value.as_ref()),
            ],
        )?;
        self.read_flag()
    }

    /// HEXISTS key field
    pub fn hexists(&mut self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(
            &command::HEXISTS,
            &[Arg::Text(key.as_ref()), Arg::Text(field.as_ref())],
        )?;
        self.read_flag()
    }

    /// HDEL key field; true when the field was removed
    pub fn hdel(&mut self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<bool> {
        self.execute(
            &command::HDEL,
            &[Arg::Text(key.as_ref()), Arg::Text(field.as_ref())],
        )?;
        self.read_flag()
    }

    // =========================================================================
    // Pub/sub
    // =========================================================================

    /// PUBLISH channel message; returns the number of receivers
    pub fn publish(
        &mut self,
        channel: impl AsRef<[u8]>,
        message: impl AsRef<[u8]>,
    ) -> Result<i64> {
        self.execute(
            &command::PUBLISH,
            &[Arg::Text(channel.as_ref()), Arg::Text(message.as_ref())],
        )?;
        self.read_integer()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn push(&mut self, spec: &CommandSpec, key: &[u8], values: &[Arg<'_>]) -> Result<i64> {
        self.execute_parts(spec, &[Arg::Text(key)], values)?;
        self.read_integer()
    }

    /// A 0/1 integer reply
    fn read_flag(&mut self) -> Result<bool> {
        Ok(self.read_integer()? > 0)
    }

    /// Next multi-bulk element, a bulk string holding an unsigned decimal
    fn read_decimal_element(&mut self) -> Result<u64> {
        let kind = self.next_element()?;
        if kind != ReplyKind::Bulk {
            self.skip_reply()?;
            return Err(RespError::UnexpectedReply {
                expected: ReplyKind::Bulk,
                actual: kind,
            });
        }

        let mut field = [0u8; TIME_FIELD_CAPACITY];
        let len = self
            .read_bulk(&mut field)?
            .ok_or_else(|| RespError::Protocol("null element".to_string()))?;
        std::str::from_utf8(&field[..len])
            .ok()
            .and_then(|text| text.parse::<u64>().ok())
            .ok_or_else(|| {
                RespError::Protocol(format!(
                    "expected a decimal, got {:?}",
                    String::from_utf8_lossy(&field[..len])
                ))
            })
    }

    pub(super) fn drain_elements(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.next_element()?;
            self.skip_reply()?;
        }
        Ok(())
    }
}
