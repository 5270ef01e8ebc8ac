use tokio::io::AsyncRead;
// Import multipart-parser types.
use multipart_parser::{Control, MultipartParser, Settings, StreamParser};

#[derive(Debug, Default)]
struct Contents {
    parts: Vec<Vec<u8>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate an `AsyncRead` and the boundary from somewhere e.g. server request body.
    let (reader, boundary) = get_async_reader_from_somewhere().await;

    // Collect every part body into memory.
    let settings = Settings::<Contents>::new()
        .on_part_data_begin(|contents| {
            contents.parts.push(Vec::new());
            Control::Continue
        })
        .on_part_data(|contents, data| {
            if let Some(part) = contents.parts.last_mut() {
                part.extend_from_slice(data);
            }
            Control::Continue
        });

    // Create a `StreamParser` instance from that async reader and the boundary.
    let parser = MultipartParser::new(boundary, settings)?;
    let mut stream_parser = StreamParser::with_reader(reader, parser);

    // Nothing pauses, so this runs until the final boundary.
    let status = stream_parser.run().await?;
    println!("Status: {:?}, Bytes: {}", status, stream_parser.bytes_consumed());

    for part in stream_parser.into_parser().into_user_data().parts {
        println!("Content: {:?}", String::from_utf8_lossy(&part));
    }

    Ok(())
}

// Generate an `AsyncRead` and the boundary from somewhere e.g. server request body.
async fn get_async_reader_from_somewhere() -> (impl AsyncRead + Send, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "X-BOUNDARY")
}
