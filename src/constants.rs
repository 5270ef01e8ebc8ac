/// The longest boundary accepted by [`MultipartParser`](crate::MultipartParser), excluding the
/// leading `--`.
pub const MAX_BOUNDARY_LEN: usize = 256;

pub(crate) const BOUNDARY_EXT: &[u8] = b"--";
pub(crate) const CRLF: &[u8] = b"\r\n";
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';
pub(crate) const HYPHEN: u8 = b'-';
pub(crate) const COLON: u8 = b':';
pub(crate) const SPACE: u8 = b' ';
pub(crate) const TAB: u8 = b'\t';

// CRLF + "--" + boundary.
pub(crate) const MAX_DELIMITER_LEN: usize = CRLF.len() + BOUNDARY_EXT.len() + MAX_BOUNDARY_LEN;

static TOKEN: [bool; 256] = token_table();

const fn token_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;

    while b < 256 {
        let c = b as u8;
        table[b] = c.is_ascii_alphanumeric()
            || matches!(
                c,
                b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
            );
        b += 1;
    }

    table
}

/// Whether `b` is an RFC 7230 `tchar`, the set allowed in header field names.
#[inline]
pub(crate) fn is_token(b: u8) -> bool {
    TOKEN[b as usize]
}

static BCHAR: [bool; 256] = bchar_table();

const fn bchar_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0;

    while b < 256 {
        let c = b as u8;
        table[b] = c.is_ascii_alphanumeric()
            || matches!(
                c,
                b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
            );
        b += 1;
    }

    table
}

/// Whether `b` is an RFC 2046 `bchars` byte, the set allowed in a boundary.
#[inline]
pub(crate) fn is_bchar(b: u8) -> bool {
    BCHAR[b as usize]
}
