use crate::boundary::{self, Match, Matcher};
use crate::buffer::{DataKind, OutputBuffer};
use crate::constants::{self, is_token};
use crate::settings::{Control, NotifyCallback, Settings};
use crate::state::State;
use crate::ErrorKind;
use std::fmt::{self, Debug, Formatter};

/// A streaming `multipart/form-data` parser.
///
/// Feed the body in chunks of any size with [`execute`](MultipartParser::execute). The parser
/// invokes the [`Settings`] callbacks synchronously as it recognizes header fields, header
/// values, part data and lifecycle events, and never buffers more than the (optional) output
/// buffer, so the memory it uses does not depend on the size of the body.
///
/// The user data `T` is handed to every callback and is otherwise left alone.
///
/// # Examples
///
/// ```
/// use multipart_parser::{Control, MultipartParser, Settings};
///
/// let settings = Settings::<Vec<u8>>::new().on_part_data(|body, data| {
///     body.extend_from_slice(data);
///     Control::Continue
/// });
/// let mut parser = MultipartParser::new("X-BOUNDARY", settings).unwrap();
///
/// let data = b"--X-BOUNDARY\r\nContent-Type: text/plain\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// for chunk in data.chunks(7) {
///     assert_eq!(parser.execute(chunk), chunk.len());
/// }
///
/// assert!(parser.is_finished());
/// assert_eq!(parser.user_data(), b"abcd");
/// ```
pub struct MultipartParser<T = ()> {
    settings: Settings<T>,
    user_data: T,
    matcher: Matcher,
    state: State,
    error: ErrorKind,
    buffer: OutputBuffer,
    // The last byte of a paused call was processed but reported as unconsumed; the next call
    // starts with it.
    held_byte: bool,
}

enum Outcome {
    Done,
    Paused(usize),
    Failed(ErrorKind, usize),
}

impl<T: Default> MultipartParser<T> {
    /// Creates a parser for the given boundary (without the leading `--`), with default user
    /// data.
    pub fn new<B: AsRef<[u8]>>(boundary: B, settings: Settings<T>) -> crate::Result<MultipartParser<T>> {
        MultipartParser::with_user_data(boundary, settings, T::default())
    }
}

impl<T> MultipartParser<T> {
    /// Creates a parser for the given boundary (without the leading `--`) that passes
    /// `user_data` to every callback.
    pub fn with_user_data<B: AsRef<[u8]>>(
        boundary: B,
        settings: Settings<T>,
        user_data: T,
    ) -> crate::Result<MultipartParser<T>> {
        let mut matcher = Matcher::new(boundary.as_ref())?;
        matcher.start_at(boundary::DASH_BOUNDARY);

        debug!(
            "multipart parser created, boundary: {:?}, buffer size: {}",
            String::from_utf8_lossy(boundary.as_ref()),
            settings.buffer_size
        );

        Ok(MultipartParser {
            buffer: OutputBuffer::new(settings.buffer_size),
            settings,
            user_data,
            matcher,
            state: State::Start,
            error: ErrorKind::Ok,
            held_byte: false,
        })
    }

    /// Parses the next chunk of the body and returns how many bytes of it were consumed.
    ///
    /// A count smaller than `buf.len()` means parsing stopped; check [`error`](Self::error).
    /// On [`ErrorKind::Paused`] call `execute` again with `&buf[consumed..]` to resume. Any
    /// other error is fatal: the count is the offset of the offending byte and further calls
    /// fail with [`ErrorKind::InvalidState`] until [`reset`](Self::reset).
    pub fn execute(&mut self, buf: &[u8]) -> usize {
        if self.error.is_fatal() {
            debug!("multipart parser fed after error: {}", self.error);
            self.error = ErrorKind::InvalidState;
            return 0;
        }

        if buf.is_empty() {
            return 0;
        }

        self.error = ErrorKind::Ok;

        let start = if self.held_byte {
            self.held_byte = false;
            1
        } else {
            0
        };

        match self.run(buf, start) {
            Outcome::Done => buf.len(),
            Outcome::Paused(consumed) => {
                self.error = ErrorKind::Paused;
                trace!("multipart parser paused in state {:?}", self.state);

                if consumed == buf.len() {
                    self.held_byte = true;
                    consumed - 1
                } else {
                    consumed
                }
            }
            Outcome::Failed(kind, at) => {
                self.error = kind;
                debug!("multipart parse error at byte {} of chunk ({:?}): {}", at, self.state, kind);
                at
            }
        }
    }

    fn run(&mut self, buf: &[u8], mut pos: usize) -> Outcome {
        let len = buf.len();

        // Start of the span of header field, header value or part data bytes not yet emitted.
        let mut mark = match self.state {
            State::HeaderField | State::HeaderValue | State::PartData => Some(pos),
            _ => None,
        };

        loop {
            if self.state.is_notify() {
                if !self.buffer.is_empty() {
                    if self.flush() == Control::Pause {
                        return Outcome::Paused(pos);
                    }
                    continue;
                }

                let next = match self.state {
                    State::NotifyPartBegin => State::HeaderFieldStart,
                    State::NotifyHeadersComplete => {
                        mark = Some(pos);
                        State::PartData
                    }
                    State::NotifyPartEnd => State::AfterBoundary,
                    _ => State::End,
                };

                let event = self.state;
                self.state = next;

                if self.notify(event) == Control::Pause {
                    return Outcome::Paused(pos);
                }
                continue;
            }

            if pos >= len {
                break;
            }

            let b = buf[pos];

            match self.state {
                State::Start => match self.matcher.feed(b) {
                    Match::Partial => pos += 1,
                    Match::Complete => {
                        self.state = State::AfterBoundary;
                        pos += 1;
                    }
                    // Not a boundary at offset 0, so everything up to the first CRLF-prefixed
                    // boundary is preamble. Re-examine this byte as such.
                    Match::Mismatch(_) => self.state = State::Preamble,
                },
                State::Preamble => {
                    if self.matcher.index() == 0 {
                        match memchr::memchr(constants::CR, &buf[pos..]) {
                            Some(offset) => pos += offset,
                            None => {
                                pos = len;
                                continue;
                            }
                        }
                    }

                    match self.matcher.feed(buf[pos]) {
                        Match::Partial => pos += 1,
                        Match::Complete => {
                            self.state = State::AfterBoundary;
                            pos += 1;
                        }
                        Match::Mismatch(0) => pos += 1,
                        Match::Mismatch(_) => {}
                    }
                }
                State::AfterBoundary => {
                    self.state = match b {
                        constants::CR => State::AfterBoundaryCr,
                        constants::HYPHEN => State::FinalHyphen,
                        _ => return Outcome::Failed(ErrorKind::InvalidBoundary, pos),
                    };
                    pos += 1;
                }
                State::AfterBoundaryCr => {
                    if b != constants::LF {
                        return Outcome::Failed(ErrorKind::InvalidBoundary, pos);
                    }
                    self.state = State::NotifyPartBegin;
                    pos += 1;
                }
                State::FinalHyphen => {
                    if b != constants::HYPHEN {
                        return Outcome::Failed(ErrorKind::InvalidBoundary, pos);
                    }
                    self.state = State::NotifyBodyEnd;
                    pos += 1;
                }
                State::HeaderFieldStart => {
                    if b == constants::CR {
                        self.state = State::HeadersAlmostDone;
                    } else if is_token(b) {
                        mark = Some(pos);
                        self.state = State::HeaderField;
                    } else {
                        return Outcome::Failed(header_field_error(b), pos);
                    }
                    pos += 1;
                }
                State::HeaderField => {
                    while pos < len && is_token(buf[pos]) {
                        pos += 1;
                    }

                    if pos == len {
                        continue;
                    }

                    match buf[pos] {
                        constants::COLON => {
                            let start = mark.take().unwrap_or(pos);
                            self.state = State::HeaderValueStart;

                            let control = self.emit(DataKind::HeaderField, &buf[start..pos]);
                            pos += 1;

                            if control == Control::Pause {
                                return Outcome::Paused(pos);
                            }
                        }
                        constants::CR | constants::LF => return Outcome::Failed(ErrorKind::InvalidHeaderFormat, pos),
                        _ => return Outcome::Failed(ErrorKind::InvalidHeaderField, pos),
                    }
                }
                State::HeaderValueStart => match b {
                    constants::SPACE | constants::TAB => pos += 1,
                    constants::CR => {
                        self.state = State::HeaderValueAlmostDone;
                        pos += 1;
                    }
                    _ => {
                        mark = Some(pos);
                        self.state = State::HeaderValue;
                    }
                },
                State::HeaderValue => match memchr::memchr(constants::CR, &buf[pos..]) {
                    Some(offset) => {
                        let start = mark.take().unwrap_or(pos);
                        let end = pos + offset;
                        self.state = State::HeaderValueAlmostDone;

                        let control = self.emit(DataKind::HeaderValue, &buf[start..end]);
                        pos = end + 1;

                        if control == Control::Pause {
                            return Outcome::Paused(pos);
                        }
                    }
                    None => pos = len,
                },
                State::HeaderValueAlmostDone => {
                    if b != constants::LF {
                        return Outcome::Failed(ErrorKind::InvalidHeaderFormat, pos);
                    }
                    self.state = State::HeaderFieldStart;
                    pos += 1;
                }
                State::HeadersAlmostDone => {
                    if b != constants::LF {
                        return Outcome::Failed(ErrorKind::InvalidHeaderFormat, pos);
                    }
                    self.state = State::NotifyHeadersComplete;
                    pos += 1;
                }
                State::PartData => match memchr::memchr(constants::CR, &buf[pos..]) {
                    Some(offset) => {
                        let start = mark.take().unwrap_or(pos);
                        let end = pos + offset;

                        // The CR is withheld until we know whether it starts the delimiter.
                        self.matcher.start_at(1);
                        self.state = State::PartDataBoundary;

                        let control = self.emit(DataKind::PartData, &buf[start..end]);
                        pos = end + 1;

                        if control == Control::Pause {
                            return Outcome::Paused(pos);
                        }
                    }
                    None => pos = len,
                },
                State::PartDataBoundary => match self.matcher.feed(b) {
                    Match::Partial => pos += 1,
                    Match::Complete => {
                        self.state = State::NotifyPartEnd;
                        pos += 1;
                    }
                    Match::Mismatch(withheld) => {
                        // Hand the withheld bytes over as data and look at this byte again, it
                        // may be the CR of the real delimiter.
                        mark = Some(pos);
                        self.state = State::PartData;

                        if self.emit_withheld(withheld) == Control::Pause {
                            return Outcome::Paused(pos);
                        }
                    }
                },
                State::End => pos = len,
                State::NotifyPartBegin | State::NotifyHeadersComplete | State::NotifyPartEnd | State::NotifyBodyEnd => continue,
            }
        }

        if let Some(start) = mark {
            let kind = match self.state {
                State::HeaderField => Some(DataKind::HeaderField),
                State::HeaderValue => Some(DataKind::HeaderValue),
                State::PartData => Some(DataKind::PartData),
                _ => None,
            };

            if let Some(kind) = kind {
                if start < len && self.emit(kind, &buf[start..]) == Control::Pause {
                    return Outcome::Paused(len);
                }
            }
        }

        Outcome::Done
    }

    fn emit(&mut self, kind: DataKind, data: &[u8]) -> Control {
        let MultipartParser {
            buffer,
            settings,
            user_data,
            ..
        } = self;

        buffer.push(kind, data, |kind, data| dispatch(settings, user_data, kind, data))
    }

    fn emit_withheld(&mut self, len: usize) -> Control {
        let MultipartParser {
            buffer,
            settings,
            user_data,
            matcher,
            ..
        } = self;

        buffer.push(DataKind::PartData, matcher.prefix(len), |kind, data| {
            dispatch(settings, user_data, kind, data)
        })
    }

    fn flush(&mut self) -> Control {
        let MultipartParser {
            buffer,
            settings,
            user_data,
            ..
        } = self;

        buffer.flush(|kind, data| dispatch(settings, user_data, kind, data))
    }

    fn notify(&mut self, event: State) -> Control {
        let callback: &mut Option<NotifyCallback<T>> = match event {
            State::NotifyPartBegin => &mut self.settings.on_part_data_begin,
            State::NotifyHeadersComplete => &mut self.settings.on_headers_complete,
            State::NotifyPartEnd => &mut self.settings.on_part_data_end,
            _ => &mut self.settings.on_body_end,
        };

        match callback {
            Some(callback) => callback(&mut self.user_data),
            None => Control::Continue,
        }
    }

    /// Returns the parser to its initial state, ready for a new body.
    ///
    /// With `Some(boundary)` the boundary is replaced, otherwise it is kept. The new boundary
    /// may not be longer than the one the parser was created with. The callbacks, the user data
    /// and the output buffer's capacity are kept; the error, any partial boundary match and any
    /// buffered output are cleared. If the new boundary is invalid nothing changes.
    pub fn reset(&mut self, boundary: Option<&[u8]>) -> crate::Result<()> {
        if let Some(boundary) = boundary {
            self.matcher.set_boundary(boundary)?;
        }

        self.matcher.start_at(boundary::DASH_BOUNDARY);
        self.state = State::Start;
        self.error = ErrorKind::Ok;
        self.buffer.clear();
        self.held_byte = false;

        debug!(
            "multipart parser reset, boundary: {:?}",
            String::from_utf8_lossy(self.matcher.boundary())
        );

        Ok(())
    }

    pub(crate) fn fail(&mut self, kind: ErrorKind) {
        debug!("multipart parser failed: {}", kind);
        self.error = kind;
    }

    /// The current boundary, without the leading `--`.
    pub fn boundary(&self) -> &[u8] {
        self.matcher.boundary()
    }

    /// The status of the last [`execute`](Self::execute) call. Sticky until
    /// [`reset`](Self::reset), except [`ErrorKind::Paused`] which the next call clears.
    pub fn error(&self) -> ErrorKind {
        self.error
    }

    /// A human-readable description of [`error`](Self::error).
    pub fn error_message(&self) -> &'static str {
        self.error.message()
    }

    /// Whether the final boundary has been seen.
    pub fn is_finished(&self) -> bool {
        self.state == State::End
    }

    pub fn user_data(&self) -> &T {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut T {
        &mut self.user_data
    }

    /// Replaces the user data, returning the previous value.
    pub fn set_user_data(&mut self, user_data: T) -> T {
        std::mem::replace(&mut self.user_data, user_data)
    }

    pub fn into_user_data(self) -> T {
        self.user_data
    }
}

fn dispatch<T>(settings: &mut Settings<T>, user_data: &mut T, kind: DataKind, data: &[u8]) -> Control {
    let callback = match kind {
        DataKind::HeaderField => settings.on_header_field.as_mut(),
        DataKind::HeaderValue => settings.on_header_value.as_mut(),
        DataKind::PartData => settings.on_part_data.as_mut(),
    };

    match callback {
        Some(callback) => callback(user_data, data),
        None => Control::Continue,
    }
}

fn header_field_error(b: u8) -> ErrorKind {
    match b {
        constants::COLON | constants::SPACE | constants::TAB | constants::LF => ErrorKind::InvalidHeaderFormat,
        _ => ErrorKind::InvalidHeaderField,
    }
}

impl<T> Debug for MultipartParser<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartParser")
            .field("matcher", &self.matcher)
            .field("state", &self.state)
            .field("error", &self.error)
            .field("buffer", &self.buffer)
            .field("settings", &self.settings)
            .finish()
    }
}
