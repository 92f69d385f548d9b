//! HTTP/1.1 transport (spec §4.9.1).
//!
//! Grounded on `penumbra-x-rquest/src/client/core/proto/h1/mod.rs`'s
//! request/response framing, rewritten as a direct byte-in/byte-out
//! function over a raw stream instead of through hyper's internal codec,
//! since specter owns the socket end to end (spec §9 "coroutine vs.
//! thread duality": wire-level code is shared, only the I/O edge
//! differs).

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::{RawResponse, RequestPlan};

/// Writes `plan` as an HTTP/1.1 request and reads the full response,
/// applying the body-length resolution rules of spec §4.9.1. Takes `io`
/// by mutable reference so the caller (the pool) keeps ownership and can
/// return the connection afterward unless the response asked to close.
pub async fn send<IO>(io: &mut IO, plan: &RequestPlan) -> crate::Result<RawResponse>
where
    IO: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let mut reader = BufReader::new(io);
    write_request(reader.get_mut(), plan).await?;
    read_response(&mut reader).await
}

pub(crate) async fn write_request<IO>(io: &mut IO, plan: &RequestPlan) -> crate::Result<()>
where
    IO: AsyncWrite + Unpin + ?Sized,
{
    let mut out = format!("{} {} HTTP/1.1\r\n", plan.method, plan.path_and_query);
    for (name, value) in &plan.headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    io.write_all(out.as_bytes())
        .await
        .map_err(crate::error::map_io)?;
    if !plan.body.is_empty() {
        io.write_all(&plan.body).await.map_err(crate::error::map_io)?;
    }
    io.flush().await.map_err(crate::error::map_io)?;
    Ok(())
}

async fn read_response<IO>(reader: &mut BufReader<IO>) -> crate::Result<RawResponse>
where
    IO: AsyncRead + Unpin,
{
    let (status, reason) = read_status_line(reader).await?;
    let headers = read_headers(reader).await?;

    let transfer_encoding = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("transfer-encoding"))
        .map(|(_, v)| v.to_ascii_lowercase());
    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok());

    let body = if transfer_encoding
        .as_deref()
        .map(|v| v.split(',').last().map(str::trim) == Some("chunked"))
        .unwrap_or(false)
    {
        read_chunked(reader).await?
    } else if let Some(len) = content_length {
        read_exact_len(reader, len).await?
    } else {
        read_until_eof(reader).await?
    };

    Ok(RawResponse {
        status,
        reason,
        headers,
        body,
    })
}

pub(crate) async fn read_line<IO: AsyncRead + Unpin>(reader: &mut BufReader<IO>) -> crate::Result<String> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .await
        .map_err(crate::error::map_io)?;
    if n == 0 {
        return Err(crate::Error::protocol("connection closed before a complete line"));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

pub(crate) async fn read_status_line<IO: AsyncRead + Unpin>(
    reader: &mut BufReader<IO>,
) -> crate::Result<(u16, Option<String>)> {
    let line = read_line(reader).await?;
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().unwrap_or_default();
    let reason = parts.next().map(|s| s.to_string());
    if !version.starts_with("HTTP/") {
        return Err(crate::Error::protocol(format!("malformed status line: {line}")));
    }
    let status = code
        .parse::<u16>()
        .map_err(|_| crate::Error::protocol(format!("malformed status code: {line}")))?;
    Ok((status, reason))
}

pub(crate) async fn read_headers<IO: AsyncRead + Unpin>(
    reader: &mut BufReader<IO>,
) -> crate::Result<Vec<(String, String)>> {
    let mut headers = Vec::new();
    loop {
        let line = read_line(reader).await?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| crate::Error::protocol(format!("malformed header line: {line}")))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(headers)
}

async fn read_exact_len<IO: AsyncRead + Unpin>(
    reader: &mut BufReader<IO>,
    len: usize,
) -> crate::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(crate::error::map_io)?;
    Ok(buf)
}

async fn read_until_eof<IO: AsyncRead + Unpin>(reader: &mut BufReader<IO>) -> crate::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .map_err(crate::error::map_io)?;
    Ok(buf)
}

async fn read_chunked<IO: AsyncRead + Unpin>(reader: &mut BufReader<IO>) -> crate::Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let size_line = read_line(reader).await?;
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16)
            .map_err(|_| crate::Error::protocol(format!("malformed chunk size: {size_line}")))?;
        if size == 0 {
            // Trailers: consume until the blank line that ends them.
            loop {
                let trailer = read_line(reader).await?;
                if trailer.is_empty() {
                    break;
                }
            }
            break;
        }
        let mut chunk = vec![0u8; size];
        reader
            .read_exact(&mut chunk)
            .await
            .map_err(crate::error::map_io)?;
        body.extend_from_slice(&chunk);
        let mut crlf = [0u8; 2];
        reader
            .read_exact(&mut crlf)
            .await
            .map_err(crate::error::map_io)?;
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn writes_request_line_and_headers_then_body() {
        let (client, mut server) = duplex(4096);
        let plan = RequestPlan {
            method: "POST".to_string(),
            authority: "example.com".to_string(),
            path_and_query: "/p".to_string(),
            headers: vec![("Host".to_string(), "example.com".to_string())],
            body: b"hi".to_vec(),
        };

        let writer = tokio::spawn(async move {
            let mut io = client;
            write_request(&mut io, &plan).await.unwrap();
        });

        let mut buf = vec![0u8; 1024];
        let n = server.read(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf[..n]);
        assert!(text.starts_with("POST /p HTTP/1.1\r\n"));
        assert!(text.contains("Host: example.com\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn reads_content_length_body() {
        let (mut client, mut server) = duplex(4096);
        let response = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello";
        let writer = tokio::spawn(async move {
            server.write_all(response).await.unwrap();
        });
        let mut reader = BufReader::new(&mut client);
        let resp = read_response(&mut reader).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"hello");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn reads_chunked_body() {
        let (mut client, mut server) = duplex(4096);
        let response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        let writer = tokio::spawn(async move {
            server.write_all(response).await.unwrap();
        });
        let mut reader = BufReader::new(&mut client);
        let resp = read_response(&mut reader).await.unwrap();
        assert_eq!(resp.body, b"hello");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_status_line_is_a_protocol_error() {
        let (mut client, mut server) = duplex(4096);
        let writer = tokio::spawn(async move {
            server.write_all(b"NOT A STATUS LINE\r\n\r\n").await.unwrap();
        });
        let mut reader = BufReader::new(&mut client);
        let err = read_response(&mut reader).await.unwrap_err();
        assert!(err.is_protocol());
        writer.await.unwrap();
    }
}
