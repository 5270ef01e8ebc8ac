use crate::settings::Control;
use bytes::BytesMut;

/// Which data callback a span of bytes is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DataKind {
    HeaderField,
    HeaderValue,
    PartData,
}

/// Coalesces consecutive spans of the same [`DataKind`] into fewer, larger callback
/// invocations. With a capacity of zero every span is handed over as is.
#[derive(Debug)]
pub(crate) struct OutputBuffer {
    buf: BytesMut,
    capacity: usize,
    kind: DataKind,
}

impl OutputBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        OutputBuffer {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            kind: DataKind::PartData,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Hands `data` over to `emit`, either now or once enough has accumulated.
    ///
    /// At most two invocations happen: the previous contents, then `data` itself when it is too
    /// large to buffer. Both always happen; the returned signal is `Pause` if either asked for it.
    pub(crate) fn push<F>(&mut self, kind: DataKind, data: &[u8], mut emit: F) -> Control
    where
        F: FnMut(DataKind, &[u8]) -> Control,
    {
        if data.is_empty() {
            return Control::Continue;
        }

        if self.capacity == 0 {
            return emit(kind, data);
        }

        let mut control = Control::Continue;

        if !self.buf.is_empty() && (self.kind != kind || self.buf.len() + data.len() > self.capacity) {
            control = self.flush(&mut emit);
        }

        if self.buf.is_empty() && data.len() >= self.capacity {
            return control.or(emit(kind, data));
        }

        self.buf.extend_from_slice(data);
        self.kind = kind;

        if self.buf.len() == self.capacity {
            control = control.or(self.flush(&mut emit));
        }

        control
    }

    /// Hands the accumulated bytes over, if any. The buffer is empty afterwards whatever `emit`
    /// returns.
    pub(crate) fn flush<F>(&mut self, mut emit: F) -> Control
    where
        F: FnMut(DataKind, &[u8]) -> Control,
    {
        if self.buf.is_empty() {
            return Control::Continue;
        }

        let control = emit(self.kind, &self.buf[..]);
        self.buf.clear();
        control
    }

    /// Drops the accumulated bytes, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Emitted = Vec<(DataKind, Vec<u8>)>;

    fn recorder(out: &mut Emitted) -> impl FnMut(DataKind, &[u8]) -> Control + '_ {
        move |kind, data| {
            out.push((kind, data.to_vec()));
            Control::Continue
        }
    }

    #[test]
    fn test_unbuffered_passthrough() {
        let mut out = Emitted::new();
        let mut buffer = OutputBuffer::new(0);

        buffer.push(DataKind::PartData, b"abc", recorder(&mut out));
        buffer.push(DataKind::PartData, b"", recorder(&mut out));
        buffer.push(DataKind::PartData, b"de", recorder(&mut out));

        assert_eq!(
            out,
            vec![(DataKind::PartData, b"abc".to_vec()), (DataKind::PartData, b"de".to_vec())]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_coalesces_until_full() {
        let mut out = Emitted::new();
        let mut buffer = OutputBuffer::new(4);

        for b in b"abcdefghij".chunks(1) {
            buffer.push(DataKind::PartData, b, recorder(&mut out));
        }
        assert_eq!(
            out,
            vec![(DataKind::PartData, b"abcd".to_vec()), (DataKind::PartData, b"efgh".to_vec())]
        );

        buffer.flush(recorder(&mut out));
        assert_eq!(out[2], (DataKind::PartData, b"ij".to_vec()));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_kind_change_flushes() {
        let mut out = Emitted::new();
        let mut buffer = OutputBuffer::new(16);

        buffer.push(DataKind::HeaderField, b"Content-", recorder(&mut out));
        buffer.push(DataKind::HeaderField, b"Type", recorder(&mut out));
        buffer.push(DataKind::HeaderValue, b"text/plain", recorder(&mut out));
        buffer.flush(recorder(&mut out));

        assert_eq!(
            out,
            vec![
                (DataKind::HeaderField, b"Content-Type".to_vec()),
                (DataKind::HeaderValue, b"text/plain".to_vec()),
            ]
        );
    }

    #[test]
    fn test_large_span_bypasses_buffer() {
        let mut out = Emitted::new();
        let mut buffer = OutputBuffer::new(4);

        buffer.push(DataKind::PartData, b"ab", recorder(&mut out));
        buffer.push(DataKind::PartData, b"0123456789", recorder(&mut out));

        assert_eq!(
            out,
            vec![(DataKind::PartData, b"ab".to_vec()), (DataKind::PartData, b"0123456789".to_vec())]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_pause_from_flush_still_delivers_span() {
        let mut calls = 0;
        let mut buffer = OutputBuffer::new(4);

        buffer.push(DataKind::PartData, b"abc", |_, _| Control::Continue);
        let control = buffer.push(DataKind::PartData, b"defgh", |_, _| {
            calls += 1;
            if calls == 1 {
                Control::Pause
            } else {
                Control::Continue
            }
        });

        assert_eq!(control, Control::Pause);
        assert_eq!(calls, 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear_discards() {
        let mut out = Emitted::new();
        let mut buffer = OutputBuffer::new(8);

        buffer.push(DataKind::PartData, b"abc", recorder(&mut out));
        buffer.clear();
        buffer.flush(recorder(&mut out));

        assert!(out.is_empty());
    }
}
