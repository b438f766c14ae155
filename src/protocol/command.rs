//! Command definitions
//!
//! Every command the client issues is described by one `CommandSpec`: its
//! literal name, the shape of each argument after the name, and the reply
//! kind it answers with. The client methods are thin wrappers that pass
//! arguments through `Client::execute` against these entries.

use crate::error::{RespError, Result};
use super::encoder::Arg;
use super::reply::ReplyKind;

/// Shape of one argument position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// A key name
    Key,
    /// Any text value (field, value, channel, message)
    Text,
    /// A decimal integer
    Integer,
    /// A decimal float
    Float,
    /// One or more further arguments of any type; only valid last
    Variadic,
}

impl ArgShape {
    fn accepts(self, arg: &Arg<'_>) -> bool {
        match self {
            ArgShape::Key | ArgShape::Text => matches!(arg, Arg::Text(_)),
            ArgShape::Integer => matches!(arg, Arg::Integer(_)),
            ArgShape::Float => matches!(arg, Arg::Float(_)),
            ArgShape::Variadic => true,
        }
    }
}

/// Declarative description of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub args: &'static [ArgShape],
    pub reply: ReplyKind,
}

impl CommandSpec {
    /// Check `args` against the declared shapes; returns the frame's argc
    pub fn check(&self, args: &[Arg<'_>]) -> Result<usize> {
        self.check_parts(args, &[])
    }

    /// `check` for arguments split into fixed leading ones and a tail
    pub fn check_parts(&self, head: &[Arg<'_>], tail: &[Arg<'_>]) -> Result<usize> {
        let count = head.len() + tail.len();
        let variadic = self.args.last() == Some(&ArgShape::Variadic);
        let fixed = if variadic { self.args.len() - 1 } else { self.args.len() };

        let arity_ok = if variadic { count > fixed } else { count == fixed };
        if !arity_ok {
            return Err(RespError::InvalidArgument(format!(
                "{} takes {}{} arguments, got {}",
                self.name,
                if variadic { "more than " } else { "" },
                fixed,
                count
            )));
        }

        let args = head.iter().chain(tail);
        for (position, (shape, arg)) in self.args.iter().zip(args).enumerate() {
            if !shape.accepts(arg) {
                return Err(RespError::InvalidArgument(format!(
                    "{} argument {} must be {:?}, got {:?}",
                    self.name,
                    position + 1,
                    shape,
                    arg
                )));
            }
        }

        Ok(count + 1)
    }
}

macro_rules! command_table {
    ($($ident:ident => $name:literal [$($shape:ident),*] -> $reply:ident;)*) => {
        $(
            pub const $ident: CommandSpec = CommandSpec {
                name: $name,
                args: &[$(ArgShape::$shape),*],
                reply: ReplyKind::$reply,
            };
        )*

        /// Every command in the table
        pub const ALL: &[CommandSpec] = &[$($ident),*];
    };
}

command_table! {
    PING      => "PING"        []                          -> SingleLine;

    // Strings and counters
    SET       => "SET"         [Key, Text]                 -> SingleLine;
    GET       => "GET"         [Key]                       -> Bulk;
    APPEND    => "APPEND"      [Key, Text]                 -> Integer;
    INCR      => "INCR"        [Key]                       -> Integer;
    DECR      => "DECR"        [Key]                       -> Integer;
    INCRBY    => "INCRBY"      [Key, Integer]              -> Integer;
    DECRBY    => "DECRBY"      [Key, Integer]              -> Integer;
    INCRBYFLOAT => "INCRBYFLOAT" [Key, Float]              -> Bulk;

    // Keyspace
    EXISTS    => "EXISTS"      [Key]                       -> Integer;
    DEL       => "DEL"         [Key]                       -> Integer;
    PERSIST   => "PERSIST"     [Key]                       -> Integer;
    EXPIRE    => "EXPIRE"      [Key, Integer]              -> Integer;
    TTL       => "TTL"         [Key]                       -> Integer;

    // Lists
    RPUSH     => "RPUSH"       [Key, Variadic]             -> Integer;
    LPUSH     => "LPUSH"       [Key, Variadic]             -> Integer;
    LPOP      => "LPOP"        [Key]                       -> Bulk;
    LSET      => "LSET"        [Key, Integer, Text]        -> SingleLine;
    LTRIM     => "LTRIM"       [Key, Integer, Integer]     -> SingleLine;
    LINDEX    => "LINDEX"      [Key, Integer]              -> Bulk;
    LLEN      => "LLEN"        [Key]                       -> Integer;

    // Hashes
    HGET      => "HGET"        [Key, Text]                 -> Bulk;
    HSET      => "HSET"        [Key, Text, Text]           -> Integer;
    HEXISTS   => "HEXISTS"     [Key, Text]                 -> Integer;
    HDEL      => "HDEL"        [Key, Text]                 -> Integer;

    // Pub/sub and server
    PUBLISH   => "PUBLISH"     [Text, Text]                -> Integer;
    SUBSCRIBE => "SUBSCRIBE"   [Text]                      -> MultiBulk;
    TIME      => "TIME"        []                          -> MultiBulk;
}

/// Look a command up by name, ignoring case
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    ALL.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}
