use std::{convert::Infallible, net::SocketAddr};

use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyStream, Full};
use hyper::{body::Incoming, header::CONTENT_TYPE, Request, Response, StatusCode};
// Import the multipart-parser types.
use multipart_parser::{Control, MultipartParser, Settings, Status, StreamParser};

// What we collect about each part while the body streams through.
#[derive(Debug, Default)]
struct Part {
    headers: Vec<(String, String)>,
    bytes_len: usize,
}

#[derive(Debug, Default)]
struct Form {
    parts: Vec<Part>,
    field: String,
}

// A handler for incoming requests.
async fn handle(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    // Extract the `multipart/form-data` boundary from the headers.
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| multipart_parser::parse_boundary(ct).ok());

    // Send `BAD_REQUEST` status if the content-type is not multipart/form-data.
    if boundary.is_none() {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Full::from("BAD REQUEST"))
            .unwrap());
    }

    // Process the multipart e.g. you can store the parts in files.
    if let Err(err) = process_multipart(req.into_body(), boundary.unwrap()).await {
        return Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Full::from(format!("INTERNAL SERVER ERROR: {}", err)))
            .unwrap());
    }

    Ok(Response::new(Full::from("Success")))
}

fn settings() -> Settings<Form> {
    Settings::new()
        .on_part_data_begin(|form: &mut Form| {
            form.parts.push(Part::default());
            Control::Continue
        })
        // Header names and values may arrive in pieces.
        .on_header_field(|form: &mut Form, data: &[u8]| {
            form.field.push_str(&String::from_utf8_lossy(data));
            Control::Continue
        })
        .on_header_value(|form: &mut Form, data: &[u8]| {
            let value = String::from_utf8_lossy(data);
            let field = std::mem::take(&mut form.field);

            if let Some(part) = form.parts.last_mut() {
                match part.headers.last_mut() {
                    // Continuation of the previous value.
                    Some((_, v)) if field.is_empty() => v.push_str(&value),
                    _ => part.headers.push((field, value.into_owned())),
                }
            }
            Control::Continue
        })
        .on_part_data(|form: &mut Form, data: &[u8]| {
            // Do something with the part data e.g. write it to a file.
            if let Some(part) = form.parts.last_mut() {
                part.bytes_len += data.len();
            }
            Control::Continue
        })
        // Pause after every part so the handler can look at it.
        .on_part_data_end(|_: &mut Form| Control::Pause)
        .buffer_size(8 * 1024)
}

// Process the request body as multipart/form-data.
async fn process_multipart(body: Incoming, boundary: String) -> multipart_parser::Result<()> {
    // Convert the body into a stream of data frames.
    let body_stream = BodyStream::new(body)
        .filter_map(|result| async move { result.map(|frame| frame.into_data().ok()).transpose() });

    // Create a parser for the boundary and drive it from the request body.
    let parser = MultipartParser::new(boundary, settings())?;
    let mut stream_parser = StreamParser::new(body_stream, parser);

    loop {
        let status = stream_parser.run().await?;

        if let Some(part) = stream_parser.parser().user_data().parts.last() {
            println!("Headers: {:?}, Bytes Length: {:?}", part.headers, part.bytes_len);
        }

        if status == Status::Finished {
            break;
        }
    }

    println!("Parts: {}", stream_parser.parser().user_data().parts.len());

    Ok(())
}

#[tokio::main]
async fn main() {
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    println!("Server running at: {}", addr);

    let service = hyper::service::service_fn(handle);

    loop {
        let (socket, _remote_addr) = listener.accept().await.unwrap();
        let socket = hyper_util::rt::TokioIo::new(socket);
        tokio::spawn(async move {
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(socket, service)
                .await
            {
                eprintln!("server error: {}", e);
            }
        });
    }
}
