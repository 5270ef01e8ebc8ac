use std::fmt::{self, Debug, Display, Formatter};

use derive_more::Display;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The parser's sticky status code, as reported by
/// [`MultipartParser::error`](crate::MultipartParser::error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No error.
    Ok,

    /// A callback asked the parser to stop. Not a real error: feed the unconsumed bytes to
    /// resume.
    Paused,

    /// Malformed delimiter framing, e.g. unexpected bytes after a boundary.
    InvalidBoundary,

    /// A byte outside the header token character set in a header field name.
    InvalidHeaderField,

    /// A structurally malformed header line.
    InvalidHeaderFormat,

    /// The parser was misused, e.g. fed after a fatal error without a reset.
    InvalidState,

    /// Anything else, including an absent parser.
    Unknown,
}

impl ErrorKind {
    /// A human-readable description of this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Ok => "no error",
            ErrorKind::Paused => "parser paused by callback",
            ErrorKind::InvalidBoundary => "invalid boundary format",
            ErrorKind::InvalidHeaderField => "invalid character in header field",
            ErrorKind::InvalidHeaderFormat => "invalid header format",
            ErrorKind::InvalidState => "parser in invalid state",
            ErrorKind::Unknown => "unknown error",
        }
    }

    /// Whether parsing can't continue without a reset.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorKind::Ok | ErrorKind::Paused)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Default for ErrorKind {
    fn default() -> Self {
        ErrorKind::Ok
    }
}

/// A set of errors that can occur while setting up a parser, feeding it from a stream and in
/// other operations.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// The boundary is empty.
    #[display(fmt = "multipart boundary must not be empty")]
    EmptyBoundary,

    /// The boundary is longer than the parser supports, or, on reset, longer than the boundary
    /// the parser was created with.
    #[display(fmt = "multipart boundary is {} bytes long, the maximum is {} bytes", len, max)]
    BoundaryTooLong { len: usize, max: usize },

    /// The boundary contains a byte outside the RFC 2046 boundary character set, or ends with
    /// a space.
    #[display(fmt = "invalid byte 0x{:02x} in multipart boundary", _0)]
    InvalidBoundaryChar(u8),

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// The parser stopped on malformed input while being fed from a stream.
    #[display(fmt = "failed to parse multipart stream at byte {}: {}", offset, kind)]
    Parse { kind: ErrorKind, offset: u64 },

    /// Multipart stream is incomplete.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(BoxError),

    /// The operation was given no parser.
    #[display(fmt = "invalid parser reference")]
    InvalidParser,
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_message_matches_display() {
        let kinds = [
            ErrorKind::Ok,
            ErrorKind::Paused,
            ErrorKind::InvalidBoundary,
            ErrorKind::InvalidHeaderField,
            ErrorKind::InvalidHeaderFormat,
            ErrorKind::InvalidState,
            ErrorKind::Unknown,
        ];

        assert_eq!(ErrorKind::InvalidHeaderField.to_string(), "invalid character in header field");

        for kind in kinds.iter() {
            assert!(!kind.message().is_empty());
            assert_eq!(kind.to_string(), kind.message());
        }
    }

    #[test]
    fn test_error_kind_is_fatal() {
        assert!(!ErrorKind::Ok.is_fatal());
        assert!(!ErrorKind::Paused.is_fatal());
        assert!(ErrorKind::InvalidBoundary.is_fatal());
        assert!(ErrorKind::InvalidState.is_fatal());
        assert_eq!(ErrorKind::default(), ErrorKind::Ok);
    }

    #[test]
    fn test_error_display() {
        let err = Error::BoundaryTooLong { len: 300, max: 256 };
        assert_eq!(
            err.to_string(),
            "multipart boundary is 300 bytes long, the maximum is 256 bytes"
        );

        let err = Error::Parse {
            kind: ErrorKind::InvalidHeaderField,
            offset: 12,
        };
        assert_eq!(
            err.to_string(),
            "failed to parse multipart stream at byte 12: invalid character in header field"
        );
        assert_eq!(format!("{:?}", Error::NoBoundary), Error::NoBoundary.to_string());
        assert_eq!(
            Error::InvalidBoundaryChar(b'\r').to_string(),
            "invalid byte 0x0d in multipart boundary"
        );
    }
}
