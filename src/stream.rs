use crate::{ErrorKind, MultipartParser};
use bytes::{Buf, Bytes};
use futures_util::stream::{Stream, StreamExt, TryStreamExt};
use std::fmt::{self, Debug, Formatter};
use std::pin::Pin;
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

/// Why [`StreamParser::run`] returned successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A callback paused the parser. Call [`run`](StreamParser::run) again to resume.
    Paused,
    /// The final boundary was seen.
    Finished,
}

/// Drives a [`MultipartParser`] from a [`Stream`] of body chunks.
///
/// Chunks are fed to the parser as they arrive and only the part of a chunk the parser has not
/// consumed yet (after a pause) is kept around.
///
/// # Examples
///
/// ```
/// use multipart_parser::{Control, MultipartParser, Settings, Status, StreamParser};
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
///
/// let settings = Settings::<Vec<u8>>::new().on_part_data(|body, data| {
///     body.extend_from_slice(data);
///     Control::Continue
/// });
/// let parser = MultipartParser::new("X-BOUNDARY", settings).unwrap();
/// let mut stream_parser = StreamParser::new(stream, parser);
///
/// assert_eq!(stream_parser.run().await, Ok(Status::Finished));
/// assert_eq!(stream_parser.parser().user_data(), b"abcd");
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct StreamParser<'r, T = ()> {
    stream: Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send + 'r>>,
    parser: MultipartParser<T>,
    pending: Bytes,
    consumed: u64,
}

impl<'r, T> StreamParser<'r, T> {
    /// Construct a new `StreamParser` instance with the given [`Bytes`] stream and parser.
    pub fn new<S, O, E>(stream: S, parser: MultipartParser<T>) -> StreamParser<'r, T>
    where
        S: Stream<Item = Result<O, E>> + Send + 'r,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'r,
    {
        let stream = stream
            .map_ok(|b| b.into())
            .map_err(|err| crate::Error::StreamReadFailed(err.into()));

        StreamParser {
            stream: Box::pin(stream),
            parser,
            pending: Bytes::new(),
            consumed: 0,
        }
    }

    /// Construct a new `StreamParser` instance with the given [`AsyncRead`] reader and parser.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use multipart_parser::{MultipartParser, Settings, Status, StreamParser};
    ///
    /// # async fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let reader = data.as_bytes();
    ///
    /// let parser = MultipartParser::new("X-BOUNDARY", Settings::<()>::new()).unwrap();
    /// let mut stream_parser = StreamParser::with_reader(reader, parser);
    ///
    /// assert_eq!(stream_parser.run().await, Ok(Status::Finished));
    /// # }
    /// # tokio::runtime::Runtime::new().unwrap().block_on(run());
    /// ```
    #[cfg(feature = "tokio-io")]
    #[cfg_attr(nightly, doc(cfg(feature = "tokio-io")))]
    pub fn with_reader<R>(reader: R, parser: MultipartParser<T>) -> StreamParser<'r, T>
    where
        R: AsyncRead + Send + 'r,
    {
        StreamParser::new(ReaderStream::new(reader), parser)
    }

    /// Feeds the parser until the body ends or a callback pauses it.
    ///
    /// Fails with [`Error::Parse`](crate::Error::Parse) on malformed input, with
    /// [`Error::StreamReadFailed`](crate::Error::StreamReadFailed) if the stream yields an error
    /// and with [`Error::IncompleteStream`](crate::Error::IncompleteStream) if it ends before
    /// the final boundary.
    pub async fn run(&mut self) -> crate::Result<Status> {
        loop {
            // A byte held back by a pause in `on_body_end` still has to go through the parser.
            if self.parser.is_finished() && self.pending.is_empty() {
                debug!("multipart stream finished after {} bytes", self.consumed);
                return Ok(Status::Finished);
            }

            if self.pending.is_empty() {
                match self.stream.next().await {
                    Some(Ok(data)) => {
                        trace!("multipart stream chunk of {} bytes", data.len());
                        self.pending = data;
                        continue;
                    }
                    Some(Err(err)) => return Err(err),
                    None => return Err(crate::Error::IncompleteStream),
                }
            }

            let consumed = self.parser.execute(&self.pending);
            self.pending.advance(consumed);
            self.consumed += consumed as u64;

            match self.parser.error() {
                ErrorKind::Ok => {}
                ErrorKind::Paused => return Ok(Status::Paused),
                kind => {
                    return Err(crate::Error::Parse {
                        kind,
                        offset: self.consumed,
                    })
                }
            }
        }
    }

    /// Total number of stream bytes consumed by the parser so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    pub fn parser(&self) -> &MultipartParser<T> {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut MultipartParser<T> {
        &mut self.parser
    }

    pub fn into_parser(self) -> MultipartParser<T> {
        self.parser
    }
}

impl<'r, T> Debug for StreamParser<'r, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamParser")
            .field("parser", &self.parser)
            .field("pending", &self.pending.len())
            .field("consumed", &self.consumed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Control, Settings};
    use futures_util::stream;

    const DATA: &str = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    fn char_stream(data: &'static str) -> impl Stream<Item = crate::Result<Bytes>> {
        stream::iter(
            data.chars()
                .map(|ch| ch.to_string())
                .map(|part| crate::Result::Ok(Bytes::copy_from_slice(part.as_bytes()))),
        )
    }

    fn collecting() -> Settings<Vec<Vec<u8>>> {
        Settings::new()
            .on_part_data_begin(|parts: &mut Vec<Vec<u8>>| {
                parts.push(Vec::new());
                Control::Continue
            })
            .on_part_data(|parts: &mut Vec<Vec<u8>>, data: &[u8]| {
                if let Some(part) = parts.last_mut() {
                    part.extend_from_slice(data);
                }
                Control::Continue
            })
    }

    #[tokio::test]
    async fn test_stream_one_char_chunks() {
        let parser = MultipartParser::new("X-BOUNDARY", collecting()).unwrap();
        let mut sp = StreamParser::new(char_stream(DATA), parser);

        assert_eq!(sp.run().await, Ok(Status::Finished));
        assert_eq!(sp.bytes_consumed(), DATA.len() as u64);

        let parts = sp.into_parser().into_user_data();
        assert_eq!(parts, vec![b"abcd".to_vec(), b"Hello world\nHello\r\nWorld\rAgain".to_vec()]);
    }

    #[tokio::test]
    async fn test_stream_pause_resume() {
        let settings = collecting().on_part_data_end(|_| Control::Pause);
        let parser = MultipartParser::new("X-BOUNDARY", settings).unwrap();
        let stream = stream::once(async { crate::Result::Ok(Bytes::from(DATA)) });
        let mut sp = StreamParser::new(stream, parser);

        assert_eq!(sp.run().await, Ok(Status::Paused));
        assert_eq!(sp.parser().user_data().len(), 1);

        assert_eq!(sp.run().await, Ok(Status::Paused));
        assert_eq!(sp.parser().user_data().len(), 2);

        assert_eq!(sp.run().await, Ok(Status::Finished));
        assert_eq!(sp.bytes_consumed(), DATA.len() as u64);
    }

    #[tokio::test]
    async fn test_stream_pause_on_body_end_at_chunk_end() {
        let data = "--B\r\n\r\nx\r\n--B--";
        let settings = collecting().on_body_end(|_| Control::Pause);
        let parser = MultipartParser::new("B", settings).unwrap();
        let stream = stream::once(async move { crate::Result::Ok(Bytes::from(data)) });
        let mut sp = StreamParser::new(stream, parser);

        assert_eq!(sp.run().await, Ok(Status::Paused));
        assert!(sp.parser().is_finished());

        assert_eq!(sp.run().await, Ok(Status::Finished));
        assert_eq!(sp.bytes_consumed(), data.len() as u64);
        assert_eq!(sp.parser().error(), ErrorKind::Ok);
        assert_eq!(sp.parser().user_data(), &vec![b"x".to_vec()]);
    }

    #[tokio::test]
    async fn test_stream_incomplete() {
        let parser = MultipartParser::new("X-BOUNDARY", Settings::<()>::new()).unwrap();
        let mut sp = StreamParser::new(char_stream("--X-BOUNDARY\r\n\r\nabc"), parser);

        assert_eq!(sp.run().await, Err(crate::Error::IncompleteStream));
    }

    #[tokio::test]
    async fn test_stream_parse_error_offset() {
        let parser = MultipartParser::new("bound", Settings::<()>::new()).unwrap();
        let mut sp = StreamParser::new(char_stream("--bound\r\nContent@Type: x\r\n\r\n"), parser);

        assert_eq!(
            sp.run().await,
            Err(crate::Error::Parse {
                kind: ErrorKind::InvalidHeaderField,
                offset: 16,
            })
        );
    }

    #[tokio::test]
    async fn test_stream_read_failure() {
        let items: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"--X-BOUNDARY\r\n")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "connection reset")),
        ];
        let parser = MultipartParser::new("X-BOUNDARY", Settings::<()>::new()).unwrap();
        let mut sp = StreamParser::new(stream::iter(items), parser);

        match sp.run().await {
            Err(crate::Error::StreamReadFailed(err)) => assert_eq!(err.to_string(), "connection reset"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
