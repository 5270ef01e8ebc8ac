//! A streaming, callback-driven parser for `multipart/form-data` bodies (RFC 2046 / RFC 7578).
//!
//! [`MultipartParser`] consumes the body in chunks of any size and reports header fields,
//! header values, part data and part/body lifecycle events through the callbacks registered in
//! [`Settings`]. It never needs the whole body in memory: a delimiter split across two chunks is
//! recognized without buffering, and a CR in binary part data is passed through untouched
//! whatever the chunking.
//!
//! Callbacks can pause the parser by returning [`Control::Pause`]; feeding the unconsumed bytes
//! again resumes it. [`StreamParser`] drives a parser from an async [`Stream`](futures_util::Stream)
//! of body chunks.
//!
//! # Examples
//!
//! ```
//! use multipart_parser::{Control, MultipartParser, Settings};
//!
//! #[derive(Default)]
//! struct Form {
//!     parts: usize,
//!     data: Vec<u8>,
//! }
//!
//! let settings = Settings::<Form>::new()
//!     .on_part_data_begin(|form| {
//!         form.parts += 1;
//!         Control::Continue
//!     })
//!     .on_part_data(|form, data| {
//!         form.data.extend_from_slice(data);
//!         Control::Continue
//!     });
//!
//! let boundary = multipart_parser::parse_boundary("multipart/form-data; boundary=X-BOUNDARY").unwrap();
//! let mut parser = MultipartParser::new(boundary, settings).unwrap();
//!
//! let body = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
//! assert_eq!(parser.execute(body.as_bytes()), body.len());
//!
//! assert_eq!(parser.user_data().parts, 1);
//! assert_eq!(parser.user_data().data, b"abcd");
//! ```
//!
//! ## Optional features
//!
//! - `log` (default): logs parser setup, resets, pauses and parse errors through the
//!   [`log`](https://docs.rs/log) facade.
//! - `tokio-io`: [`StreamParser::with_reader`] for any `tokio::io::AsyncRead`.

#![cfg_attr(nightly, feature(doc_cfg))]

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (log::trace!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($t:tt)*) => (log::debug!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($t:tt)*) => {};
}

pub use bytes;
pub use constants::MAX_BOUNDARY_LEN;
pub use error::{Error, ErrorKind};
pub use parser::MultipartParser;
pub use settings::{Control, Settings};
pub use stream::{Status, StreamParser};

mod boundary;
mod buffer;
mod constants;
mod error;
pub mod handle;
mod parser;
mod settings;
mod state;
mod stream;

/// A Result type often returned from methods that can have `multipart_parser` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// # fn run() {
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(multipart_parser::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}
