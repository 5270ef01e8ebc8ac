use crate::constants::{self, is_bchar, MAX_BOUNDARY_LEN, MAX_DELIMITER_LEN};
use std::fmt::{self, Debug, Formatter};

/// Outcome of feeding one byte to a [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Match {
    /// The byte extends the current partial match.
    Partial,
    /// The byte completes the delimiter.
    Complete,
    /// The byte breaks the match. Holds how many delimiter bytes had been matched before it;
    /// they are available from [`Matcher::prefix`]. The byte itself is not consumed.
    Mismatch(usize),
}

/// Streaming matcher for the part delimiter `CRLF "--" boundary`.
///
/// The delimiter lives in an inline array sized for the longest supported boundary, and
/// progress is an index into it, so a delimiter split across any number of `execute` calls is
/// recognized without copying input.
///
/// Boundary bytes are restricted to RFC 2046 `bchars`, so CR only ever appears at the start of
/// the delimiter. A mismatch therefore never hides the start of another match inside the
/// withheld bytes.
pub(crate) struct Matcher {
    delimiter: [u8; MAX_DELIMITER_LEN],
    len: usize,
    index: usize,
    // Longest boundary accepted by `set_boundary`: the length of the first one.
    limit: usize,
}

/// Offset of `"--" boundary` within the delimiter.
pub(crate) const DASH_BOUNDARY: usize = 2;
/// Offset of the boundary itself within the delimiter.
const BOUNDARY: usize = 4;

pub(crate) fn validate(boundary: &[u8], max: usize) -> crate::Result<()> {
    if boundary.is_empty() {
        return Err(crate::Error::EmptyBoundary);
    }

    if boundary.len() > max {
        return Err(crate::Error::BoundaryTooLong {
            len: boundary.len(),
            max,
        });
    }

    if let Some(&byte) = boundary.iter().find(|b| !is_bchar(**b)) {
        return Err(crate::Error::InvalidBoundaryChar(byte));
    }

    // A trailing space is not allowed.
    if boundary.last() == Some(&constants::SPACE) {
        return Err(crate::Error::InvalidBoundaryChar(constants::SPACE));
    }

    Ok(())
}

impl Matcher {
    pub(crate) fn new(boundary: &[u8]) -> crate::Result<Matcher> {
        let mut matcher = Matcher {
            delimiter: [0; MAX_DELIMITER_LEN],
            len: 0,
            index: 0,
            limit: MAX_BOUNDARY_LEN,
        };
        matcher.set_boundary(boundary)?;
        matcher.limit = boundary.len();
        Ok(matcher)
    }

    /// Replaces the boundary and forgets any partial match. The new boundary may not be longer
    /// than the one the matcher was created with. On error nothing changes.
    pub(crate) fn set_boundary(&mut self, boundary: &[u8]) -> crate::Result<()> {
        validate(boundary, self.limit)?;

        self.delimiter[..DASH_BOUNDARY].copy_from_slice(constants::CRLF);
        self.delimiter[DASH_BOUNDARY..BOUNDARY].copy_from_slice(constants::BOUNDARY_EXT);
        self.delimiter[BOUNDARY..BOUNDARY + boundary.len()].copy_from_slice(boundary);
        self.len = BOUNDARY + boundary.len();
        self.index = 0;

        Ok(())
    }

    pub(crate) fn boundary(&self) -> &[u8] {
        &self.delimiter[BOUNDARY..self.len]
    }

    /// How many delimiter bytes are matched so far.
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Resumes matching as if the first `index` delimiter bytes were already seen.
    pub(crate) fn start_at(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.index = index;
    }

    /// The first `len` bytes of the delimiter, i.e. the bytes withheld by a partial match.
    pub(crate) fn prefix(&self, len: usize) -> &[u8] {
        &self.delimiter[..len]
    }

    pub(crate) fn feed(&mut self, b: u8) -> Match {
        if self.delimiter[self.index] != b {
            let matched = self.index;
            self.index = 0;
            return Match::Mismatch(matched);
        }

        self.index += 1;

        if self.index == self.len {
            self.index = 0;
            Match::Complete
        } else {
            Match::Partial
        }
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("boundary", &String::from_utf8_lossy(self.boundary()))
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(matcher: &mut Matcher, data: &[u8]) -> Vec<Match> {
        data.iter().map(|b| matcher.feed(*b)).collect()
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(b"", MAX_BOUNDARY_LEN), Err(crate::Error::EmptyBoundary));
        assert!(validate(b"X-BOUNDARY", MAX_BOUNDARY_LEN).is_ok());
        assert!(validate(b"----WebKitFormBoundary7MA4YWxkTrZu0gW", MAX_BOUNDARY_LEN).is_ok());
        assert!(validate(b"a'()+_,-./:=? z", MAX_BOUNDARY_LEN).is_ok());
        assert!(validate(&[b'x'; 255], MAX_BOUNDARY_LEN).is_ok());
        assert!(validate(&[b'x'; MAX_BOUNDARY_LEN], MAX_BOUNDARY_LEN).is_ok());
        assert_eq!(
            validate(&[b'x'; MAX_BOUNDARY_LEN + 1], MAX_BOUNDARY_LEN),
            Err(crate::Error::BoundaryTooLong {
                len: MAX_BOUNDARY_LEN + 1,
                max: MAX_BOUNDARY_LEN
            })
        );
    }

    #[test]
    fn test_validate_rejects_non_bchars() {
        let cases: [(&[u8], u8); 6] = [
            (b"ab\r\ncd", b'\r'),
            (b"ab\ncd", b'\n'),
            (b"\r", b'\r'),
            (b"a\"b", b'"'),
            (b"a;b", b';'),
            (b"trailing ", b' '),
        ];

        for (boundary, byte) in cases.iter() {
            assert_eq!(
                validate(boundary, MAX_BOUNDARY_LEN),
                Err(crate::Error::InvalidBoundaryChar(*byte)),
                "{:?}",
                boundary
            );
        }
    }

    #[test]
    fn test_full_match() {
        let mut matcher = Matcher::new(b"AB").unwrap();
        assert_eq!(matcher.boundary(), b"AB");

        let res = feed_all(&mut matcher, b"\r\n--AB");
        assert_eq!(res.last(), Some(&Match::Complete));
        assert!(res[..5].iter().all(|m| *m == Match::Partial));
        assert_eq!(matcher.index(), 0);
    }

    #[test]
    fn test_match_from_dash_boundary() {
        let mut matcher = Matcher::new(b"AB").unwrap();
        matcher.start_at(DASH_BOUNDARY);

        let res = feed_all(&mut matcher, b"--AB");
        assert_eq!(res, vec![Match::Partial, Match::Partial, Match::Partial, Match::Complete]);
    }

    #[test]
    fn test_mismatch_reports_withheld_prefix() {
        let mut matcher = Matcher::new(b"ABC").unwrap();

        let res = feed_all(&mut matcher, b"\r\n--AX");
        assert_eq!(res.last(), Some(&Match::Mismatch(5)));
        assert_eq!(matcher.prefix(5), b"\r\n--A");
        assert_eq!(matcher.index(), 0);
    }

    #[test]
    fn test_set_boundary_failure_keeps_state() {
        let mut matcher = Matcher::new(b"short").unwrap();
        matcher.feed(b'\r');

        assert!(matcher.set_boundary(&[b'x'; MAX_BOUNDARY_LEN + 1]).is_err());
        assert_eq!(matcher.boundary(), b"short");
        assert_eq!(matcher.index(), 1);

        assert!(matcher.set_boundary(b"ab\rcd").is_err());
        assert_eq!(matcher.boundary(), b"short");
        assert_eq!(matcher.index(), 1);

        matcher.set_boundary(b"other").unwrap();
        assert_eq!(matcher.boundary(), b"other");
        assert_eq!(matcher.index(), 0);
    }

    #[test]
    fn test_set_boundary_limited_to_first_length() {
        let mut matcher = Matcher::new(b"short").unwrap();

        assert_eq!(
            matcher.set_boundary(b"verylongboundarystring"),
            Err(crate::Error::BoundaryTooLong { len: 22, max: 5 })
        );
        assert_eq!(matcher.boundary(), b"short");

        matcher.set_boundary(b"abc").unwrap();
        assert_eq!(matcher.boundary(), b"abc");

        // The limit stays at the first boundary's length, not the current one.
        matcher.set_boundary(b"fives").unwrap();
        assert_eq!(matcher.boundary(), b"fives");
    }
}
