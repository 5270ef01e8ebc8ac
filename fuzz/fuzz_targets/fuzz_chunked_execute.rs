#![no_main]

use libfuzzer_sys::fuzz_target;
use multipart_parser::{Control, ErrorKind, MultipartParser, Settings};

// The first byte picks the chunk size, the rest is the body. Every chunking must produce the
// same part data as a single call.
fn part_data(data: &[u8], chunk_size: usize) -> Option<Vec<u8>> {
    let settings = Settings::<Vec<u8>>::new().on_part_data(|out, data| {
        out.extend_from_slice(data);
        Control::Continue
    });
    let mut parser = MultipartParser::new("b0und", settings).expect("parser");

    for chunk in data.chunks(chunk_size) {
        let consumed = parser.execute(chunk);
        assert!(consumed <= chunk.len());

        if parser.error() != ErrorKind::Ok {
            return None;
        }
    }

    parser.reset(None).expect("reset");
    assert_eq!(parser.error(), ErrorKind::Ok);

    Some(parser.into_user_data())
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let chunk_size = usize::from(data[0]).max(1);
    let body = &data[1..];

    if let (Some(whole), Some(chunked)) = (part_data(body, body.len().max(1)), part_data(body, chunk_size)) {
        assert_eq!(whole, chunked);
    }
});
