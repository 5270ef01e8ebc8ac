/// Position of the parser in the multipart grammar.
///
/// The `Notify*` states consume no input: they fire one lifecycle callback (after flushing the
/// output buffer) and move on, so a pause between two callbacks for the same byte resumes at
/// the right place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Matching `"--" boundary` at the very start of the body.
    Start,
    /// Discarding preamble while looking for `CRLF "--" boundary`.
    Preamble,
    /// A boundary was matched; expecting CR or the first hyphen of `--`.
    AfterBoundary,
    /// Expecting the LF after a boundary.
    AfterBoundaryCr,
    /// Expecting the second hyphen of the final boundary.
    FinalHyphen,
    NotifyPartBegin,
    HeaderFieldStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    /// Expecting the LF ending a header line.
    HeaderValueAlmostDone,
    /// Expecting the LF of the blank line ending the headers.
    HeadersAlmostDone,
    NotifyHeadersComplete,
    PartData,
    /// Matching the delimiter after a CR in part data.
    PartDataBoundary,
    NotifyPartEnd,
    NotifyBodyEnd,
    /// The final boundary was seen; the epilogue is ignored.
    End,
}

impl State {
    pub(crate) fn is_notify(self) -> bool {
        matches!(
            self,
            State::NotifyPartBegin | State::NotifyHeadersComplete | State::NotifyPartEnd | State::NotifyBodyEnd
        )
    }
}
