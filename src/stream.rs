//! C11: the streaming reader (spec §4.10).
//!
//! A pull-model body reader over an HTTP/1.1 connection that yields chunks
//! as they arrive instead of buffering the whole response, sharing the
//! wire-level framing resolution (content-length / chunked /
//! close-delimited) with [`crate::transport::h1`]. The connection is
//! consumed: once handed to a [`StreamingResponse`] it is never returned to
//! the pool, even after the body is fully read, since the caller may stop
//! pulling chunks at any point (spec §5, §9: auto-decompress is not
//! applied to streaming reads — it buffers the whole body, which would
//! defeat the point of streaming).

use tokio::io::{AsyncReadExt, BufReader};

use crate::conn::{BoxedIo, Conn};
use crate::header::OrderedHeaders;
use crate::transport::h1;
use crate::transport::RequestPlan;

const CHUNK_READ_SIZE: usize = 8192;

enum Framing {
    ContentLength(usize),
    Chunked,
    UntilClose,
}

enum State {
    ReadingChunkSize,
    ReadingChunkBody(usize),
    ReadingLengthBody(usize),
    ReadingUntilClose,
    Done,
    Closed,
}

/// A response whose body is pulled chunk by chunk rather than collected up
/// front (spec §4.10).
pub struct StreamingResponse {
    reader: BufReader<BoxedIo>,
    status: u16,
    reason: Option<String>,
    headers: OrderedHeaders,
    state: State,
    line_buf: Vec<u8>,
}

impl StreamingResponse {
    /// Writes `plan` over `conn` and reads the response head (status line
    /// and headers), leaving the body unread for [`next_chunk`]. Only H1
    /// connections support streaming; H2/H3 multiplexing does not map onto
    /// "own this socket until close" the way a raw H1 stream does.
    pub(crate) async fn open(conn: Conn, plan: &RequestPlan) -> crate::Result<StreamingResponse> {
        let io = conn
            .into_h1_io()
            .ok_or_else(|| crate::Error::protocol("streaming reads require an h1 connection"))?;
        let mut reader = BufReader::new(io);

        h1::write_request(reader.get_mut(), plan).await?;

        let (status, reason) = h1::read_status_line(&mut reader).await?;
        let headers = h1::read_headers(&mut reader).await?;
        let framing = resolve_framing(&headers);

        let state = match framing {
            Framing::ContentLength(0) => State::Done,
            Framing::ContentLength(len) => State::ReadingLengthBody(len),
            Framing::Chunked => State::ReadingChunkSize,
            Framing::UntilClose => State::ReadingUntilClose,
        };

        Ok(StreamingResponse {
            reader,
            status,
            reason,
            headers,
            state,
            line_buf: Vec::new(),
        })
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Pulls the next piece of body bytes, or `None` once the body is
    /// fully consumed.
    pub async fn next_chunk(&mut self) -> crate::Result<Option<Vec<u8>>> {
        loop {
            match self.state {
                State::Done | State::Closed => return Ok(None),
                State::ReadingUntilClose => {
                    let mut buf = vec![0u8; CHUNK_READ_SIZE];
                    let n = self
                        .reader
                        .read(&mut buf)
                        .await
                        .map_err(crate::error::map_io)?;
                    if n == 0 {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                State::ReadingLengthBody(remaining) => {
                    if remaining == 0 {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    let take = remaining.min(CHUNK_READ_SIZE);
                    let mut buf = vec![0u8; take];
                    self.reader
                        .read_exact(&mut buf)
                        .await
                        .map_err(crate::error::map_io)?;
                    self.state = State::ReadingLengthBody(remaining - take);
                    return Ok(Some(buf));
                }
                State::ReadingChunkSize => {
                    let size_line = h1::read_line(&mut self.reader).await?;
                    let size_str = size_line.split(';').next().unwrap_or("").trim();
                    let size = usize::from_str_radix(size_str, 16).map_err(|_| {
                        crate::Error::protocol(format!("malformed chunk size: {size_line}"))
                    })?;
                    if size == 0 {
                        loop {
                            let trailer = h1::read_line(&mut self.reader).await?;
                            if trailer.is_empty() {
                                break;
                            }
                        }
                        self.state = State::Done;
                        return Ok(None);
                    }
                    self.state = State::ReadingChunkBody(size);
                }
                State::ReadingChunkBody(size) => {
                    let mut buf = vec![0u8; size];
                    self.reader
                        .read_exact(&mut buf)
                        .await
                        .map_err(crate::error::map_io)?;
                    let mut crlf = [0u8; 2];
                    self.reader
                        .read_exact(&mut crlf)
                        .await
                        .map_err(crate::error::map_io)?;
                    self.state = State::ReadingChunkSize;
                    return Ok(Some(buf));
                }
            }
        }
    }

    /// Pulls the next line, buffering chunks and splitting on `\n` with a
    /// trailing `\r` trimmed, or `None` once the body is exhausted. A
    /// final line with no trailing `\n` is still returned (spec §4.10).
    pub async fn next_line(&mut self) -> crate::Result<Option<String>> {
        loop {
            if let Some(pos) = self.line_buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.line_buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            match self.next_chunk().await? {
                Some(chunk) => self.line_buf.extend_from_slice(&chunk),
                None if self.line_buf.is_empty() => return Ok(None),
                None => {
                    let line = std::mem::take(&mut self.line_buf);
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
                }
            }
        }
    }

    /// Drains the rest of the body through [`next_line`](Self::next_line),
    /// collecting every line into one `Vec` (spec §4.10).
    pub async fn iter_lines(&mut self) -> crate::Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Stops reading and surrenders the socket for good: it is never
    /// returned to the pool (spec §4.10, §5).
    pub fn close(&mut self) {
        self.state = State::Closed;
    }
}

fn resolve_framing(headers: &OrderedHeaders) -> Framing {
    let transfer_encoding = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("transfer-encoding"))
        .map(|(_, v)| v.to_ascii_lowercase());
    if transfer_encoding
        .as_deref()
        .map(|v| v.split(',').last().map(str::trim) == Some("chunked"))
        .unwrap_or(false)
    {
        return Framing::Chunked;
    }
    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok());
    match content_length {
        Some(len) => Framing::ContentLength(len),
        None => Framing::UntilClose,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    fn plan() -> RequestPlan {
        RequestPlan {
            method: "GET".to_string(),
            authority: "example.com".to_string(),
            path_and_query: "/".to_string(),
            headers: vec![("Host".to_string(), "example.com".to_string())],
            body: Vec::new(),
        }
    }

    #[tokio::test]
    async fn streams_content_length_body_in_one_chunk() {
        let (client, mut server) = duplex(4096);
        let writer = tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let mut total = Vec::new();
            loop {
                let n = server.read_buf(&mut total).await.unwrap();
                if n == 0 || total.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
                let _ = &mut buf;
            }
            server
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
                .await
                .unwrap();
        });

        let conn = Conn::new_h1(client);
        let mut stream = StreamingResponse::open(conn, &plan()).await.unwrap();
        assert_eq!(stream.status(), 200);
        let chunk = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(chunk, b"hello");
        assert!(stream.next_chunk().await.unwrap().is_none());
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn streams_chunked_body_as_separate_chunks() {
        let (client, mut server) = duplex(4096);
        let writer = tokio::spawn(async move {
            let mut total = Vec::new();
            loop {
                let n = server.read_buf(&mut total).await.unwrap();
                if n == 0 || total.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            server
                .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nab\r\n3\r\ncde\r\n0\r\n\r\n")
                .await
                .unwrap();
        });

        let conn = Conn::new_h1(client);
        let mut stream = StreamingResponse::open(conn, &plan()).await.unwrap();
        let first = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(first, b"ab");
        let second = stream.next_chunk().await.unwrap().unwrap();
        assert_eq!(second, b"cde");
        assert!(stream.next_chunk().await.unwrap().is_none());
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn iter_lines_splits_on_newline_and_trims_cr() {
        let (client, mut server) = duplex(4096);
        let writer = tokio::spawn(async move {
            let mut total = Vec::new();
            loop {
                let n = server.read_buf(&mut total).await.unwrap();
                if n == 0 || total.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            server
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\nab\r\ncd\nef")
                .await
                .unwrap();
        });

        let conn = Conn::new_h1(client);
        let mut stream = StreamingResponse::open(conn, &plan()).await.unwrap();
        let lines = stream.iter_lines().await.unwrap();
        assert_eq!(lines, vec!["ab".to_string(), "cd".to_string(), "ef".to_string()]);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn close_stops_further_reads() {
        let (client, mut server) = duplex(4096);
        let writer = tokio::spawn(async move {
            let mut total = Vec::new();
            loop {
                let n = server.read_buf(&mut total).await.unwrap();
                if n == 0 || total.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            server
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello")
                .await
                .unwrap();
        });

        let conn = Conn::new_h1(client);
        let mut stream = StreamingResponse::open(conn, &plan()).await.unwrap();
        stream.close();
        assert!(stream.next_chunk().await.unwrap().is_none());
        writer.await.unwrap();
    }
}
