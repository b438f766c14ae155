//! Protocol Module
//!
//! The RESP wire protocol: request encoding and reply decoding.
//!
//! ## Request Format
//! ```text
//! *<N>\r\n
//! $<len>\r\n<bytes>\r\n      (N segments)
//! ```
//!
//! ## Reply Formats
//! ```text
//! +<text>\r\n                status line
//! -<text>\r\n                error line
//! :<digits>\r\n              integer (optional leading '-')
//! $<len>\r\n<bytes>\r\n      bulk string ($-1 is null)
//! *<count>\r\n               multi-bulk, followed by <count> replies
//! ```

mod buffer;
mod encoder;
mod parser;
mod reply;

pub mod command;

pub use buffer::CommandBuffer;
pub use command::{ArgShape, CommandSpec};
pub use encoder::{Arg, CommandEncoder};
pub use parser::{ReplyParser, WaitPolicy};
pub use reply::{Numeric, NumericText, ReplyKind, NUMERIC_TEXT_CAPACITY};
