#![no_main]

use std::convert::Infallible;

use futures_util::stream::once;
use libfuzzer_sys::fuzz_target;
use multipart_parser::bytes::Bytes;
use multipart_parser::{Control, MultipartParser, Settings, Status, StreamParser};
use tokio::runtime;

fuzz_target!(|data: &[u8]| {
    let data = data.to_vec();
    let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });

    let settings = Settings::<usize>::new()
        .on_part_data(|len, data| {
            *len += data.len();
            Control::Continue
        })
        .on_part_data_end(|_| Control::Pause);
    let parser = MultipartParser::new("X-BOUNDARY", settings).expect("parser");
    let mut stream_parser = StreamParser::new(stream, parser);

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    rt.block_on(async {
        while let Ok(Status::Paused) = stream_parser.run().await {}
    })
});
