//! Entry points for embedders that keep the parser behind a nullable handle, e.g. glue code
//! exposing it to another runtime.
//!
//! Every function accepts an absent parser and degrades gracefully instead of misbehaving:
//! [`execute`] returns 0, [`error`] returns [`ErrorKind::Unknown`], [`error_message`] a generic
//! message, [`reset`] an [`Error::InvalidParser`](crate::Error::InvalidParser).

use crate::{ErrorKind, MultipartParser};

const INVALID_PARSER_MESSAGE: &str = "invalid parser reference";

/// Feeds `len` bytes of `buf` to the parser.
///
/// An absent buffer is valid only with `len == 0`; with any other length the parser's error
/// becomes [`ErrorKind::InvalidState`]. A `len` larger than the buffer is clamped to it.
pub fn execute<T>(parser: Option<&mut MultipartParser<T>>, buf: Option<&[u8]>, len: usize) -> usize {
    let parser = match parser {
        Some(parser) => parser,
        None => return 0,
    };

    match buf {
        Some(buf) => parser.execute(&buf[..len.min(buf.len())]),
        None if len == 0 => 0,
        None => {
            parser.fail(ErrorKind::InvalidState);
            0
        }
    }
}

/// See [`MultipartParser::reset`].
pub fn reset<T>(parser: Option<&mut MultipartParser<T>>, boundary: Option<&[u8]>) -> crate::Result<()> {
    match parser {
        Some(parser) => parser.reset(boundary),
        None => Err(crate::Error::InvalidParser),
    }
}

pub fn error<T>(parser: Option<&MultipartParser<T>>) -> ErrorKind {
    parser.map_or(ErrorKind::Unknown, |parser| parser.error())
}

pub fn error_message<T>(parser: Option<&MultipartParser<T>>) -> &'static str {
    parser.map_or(INVALID_PARSER_MESSAGE, |parser| parser.error_message())
}

pub fn user_data<T>(parser: Option<&MultipartParser<T>>) -> Option<&T> {
    parser.map(|parser| parser.user_data())
}

/// Replaces the user data, returning the previous value. Without a parser, `user_data` is
/// handed back.
pub fn set_user_data<T>(parser: Option<&mut MultipartParser<T>>, user_data: T) -> T {
    match parser {
        Some(parser) => parser.set_user_data(user_data),
        None => user_data,
    }
}

/// Releases the parser and everything it owns. Does nothing without a parser.
pub fn free<T>(parser: Option<MultipartParser<T>>) {
    drop(parser);
}
