use std::fmt::{self, Debug, Formatter};

/// The value every callback returns to tell the parser whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Continue parsing.
    Continue,
    /// Stop parsing now. [`execute`](crate::MultipartParser::execute) returns early and the
    /// parser reports [`ErrorKind::Paused`](crate::ErrorKind::Paused); feed the unconsumed bytes
    /// again to resume.
    Pause,
}

impl Control {
    pub(crate) fn or(self, other: Control) -> Control {
        if self == Control::Pause {
            self
        } else {
            other
        }
    }
}

impl Default for Control {
    fn default() -> Self {
        Control::Continue
    }
}

pub(crate) type DataCallback<T> = Box<dyn FnMut(&mut T, &[u8]) -> Control + Send>;
pub(crate) type NotifyCallback<T> = Box<dyn FnMut(&mut T) -> Control + Send>;

/// The callbacks a [`MultipartParser`](crate::MultipartParser) invokes while parsing, and the
/// size of its output buffer.
///
/// All callbacks are optional; a missing callback behaves as if it returned
/// [`Control::Continue`]. Every callback receives the parser's user data.
///
/// Data callbacks may be invoked several times for one header field, header value or part body,
/// each time with the next contiguous piece of it. Nothing is accumulated by the parser.
///
/// # Examples
///
/// ```
/// use multipart_parser::{Control, Settings};
///
/// let settings = Settings::<Vec<u8>>::new()
///     .on_part_data(|body, data| {
///         body.extend_from_slice(data);
///         Control::Continue
///     })
///     .buffer_size(4096);
/// ```
pub struct Settings<T> {
    pub(crate) on_header_field: Option<DataCallback<T>>,
    pub(crate) on_header_value: Option<DataCallback<T>>,
    pub(crate) on_part_data: Option<DataCallback<T>>,

    pub(crate) on_part_data_begin: Option<NotifyCallback<T>>,
    pub(crate) on_headers_complete: Option<NotifyCallback<T>>,
    pub(crate) on_part_data_end: Option<NotifyCallback<T>>,
    pub(crate) on_body_end: Option<NotifyCallback<T>>,

    pub(crate) buffer_size: usize,
}

impl<T> Settings<T> {
    /// Creates settings with no callbacks and output buffering disabled.
    pub fn new() -> Settings<T> {
        Settings::default()
    }

    /// Sets the callback for (a piece of) a header field name.
    pub fn on_header_field<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T, &[u8]) -> Control + Send + 'static,
    {
        self.on_header_field = Some(Box::new(f));
        self
    }

    /// Sets the callback for (a piece of) a header value, without the leading whitespace and
    /// the terminating CRLF.
    pub fn on_header_value<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T, &[u8]) -> Control + Send + 'static,
    {
        self.on_header_value = Some(Box::new(f));
        self
    }

    /// Sets the callback for (a piece of) a part body.
    pub fn on_part_data<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T, &[u8]) -> Control + Send + 'static,
    {
        self.on_part_data = Some(Box::new(f));
        self
    }

    /// Sets the callback fired when a new part begins, before its headers.
    pub fn on_part_data_begin<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T) -> Control + Send + 'static,
    {
        self.on_part_data_begin = Some(Box::new(f));
        self
    }

    /// Sets the callback fired after the last header of a part.
    pub fn on_headers_complete<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T) -> Control + Send + 'static,
    {
        self.on_headers_complete = Some(Box::new(f));
        self
    }

    /// Sets the callback fired when the boundary closing a part is seen.
    pub fn on_part_data_end<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T) -> Control + Send + 'static,
    {
        self.on_part_data_end = Some(Box::new(f));
        self
    }

    /// Sets the callback fired once, when the final boundary is seen.
    pub fn on_body_end<F>(mut self, f: F) -> Settings<T>
    where
        F: FnMut(&mut T) -> Control + Send + 'static,
    {
        self.on_body_end = Some(Box::new(f));
        self
    }

    /// Sets the size of the output buffer that coalesces consecutive data callbacks of the same
    /// kind. `0`, the default, disables it.
    pub fn buffer_size(mut self, size: usize) -> Settings<T> {
        self.buffer_size = size;
        self
    }
}

impl<T> Default for Settings<T> {
    fn default() -> Self {
        Settings {
            on_header_field: None,
            on_header_value: None,
            on_part_data: None,
            on_part_data_begin: None,
            on_headers_complete: None,
            on_part_data_end: None,
            on_body_end: None,
            buffer_size: 0,
        }
    }
}

impl<T> Debug for Settings<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("on_header_field", &self.on_header_field.is_some())
            .field("on_header_value", &self.on_header_value.is_some())
            .field("on_part_data", &self.on_part_data.is_some())
            .field("on_part_data_begin", &self.on_part_data_begin.is_some())
            .field("on_headers_complete", &self.on_headers_complete.is_some())
            .field("on_part_data_end", &self.on_part_data_end.is_some())
            .field("on_body_end", &self.on_body_end.is_some())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
