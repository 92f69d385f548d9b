//! HTTP/2 transport (spec §4.9.2).
//!
//! Grounded on `penumbra-x-rquest/src/client/core/proto/h2/mod.rs`'s use of
//! the `h2` crate for framing; specter drives `h2::client` directly rather
//! than through hyper's wrapper, since it owns connection setup (TLS
//! shaping, pooling) itself. The `h2` crate always emits pseudo-headers in
//! its own fixed order — `:method`, `:scheme`, `:authority`, `:path` — so
//! `profile.http2.pseudo_header_order` only drives SETTINGS ordering here;
//! true pseudo-header reordering would need a hand-rolled HPACK encoder.

use bytes::Bytes;
use h2::client::SendRequest;
use http::Request;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::profile::{Http2Profile, SettingId};

use super::{RawResponse, RequestPlan};

/// Performs the connection preface + SETTINGS exchange, shaped from
/// `profile` (spec §4.9.2 step 1), returning a request sender. The
/// connection-driving future is spawned in the background for the
/// lifetime of the stream.
pub async fn handshake<IO>(
    io: IO,
    profile: &Http2Profile,
) -> crate::Result<SendRequest<Bytes>>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut builder = h2::client::Builder::new();
    for (id, value) in &profile.settings {
        match id {
            SettingId::HeaderTableSize => {
                builder.header_table_size(*value);
            }
            SettingId::EnablePush => {
                builder.enable_push(*value != 0);
            }
            SettingId::MaxConcurrentStreams => {
                builder.max_concurrent_streams(*value);
            }
            SettingId::InitialWindowSize => {
                builder.initial_window_size(*value);
            }
            SettingId::MaxHeaderListSize => {
                builder.max_header_list_size(*value);
            }
        }
    }

    let (send_request, connection) = builder.handshake(io).await.map_err(crate::Error::protocol)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::debug!("h2 connection driver exited: {e}");
        }
    });

    send_request.ready().await.map_err(crate::Error::protocol)
}

/// Sends one request/response exchange on an established `h2` connection
/// (spec §4.9.2 steps 2-5).
pub async fn send(
    mut send_request: SendRequest<Bytes>,
    plan: &RequestPlan,
) -> crate::Result<RawResponse> {
    let mut builder = Request::builder()
        .method(plan.method.as_str())
        .uri(format!("https://{}{}", plan.authority, plan.path_and_query));

    for (name, value) in &plan.headers {
        let lower = name.to_ascii_lowercase();
        if lower == "host" || lower == "connection" || lower == "transfer-encoding" {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    let request = builder.body(()).map_err(crate::Error::protocol)?;

    let has_body = !plan.body.is_empty();
    let (response_fut, mut stream) = send_request
        .send_request(request, !has_body)
        .map_err(crate::Error::protocol)?;

    if has_body {
        stream
            .send_data(Bytes::copy_from_slice(&plan.body), true)
            .map_err(crate::Error::protocol)?;
    }

    let response = match response_fut.await {
        Ok(response) => response,
        Err(e) if e.is_io() => {
            return Err(crate::Error::protocol(format!("stream reset before headers: {e}")));
        }
        Err(e) => return Err(crate::Error::protocol(e)),
    };

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    let mut body = response.into_body();
    let mut collected = Vec::new();
    loop {
        match body.data().await {
            Some(Ok(chunk)) => {
                let _ = body.flow_control().release_capacity(chunk.len());
                collected.extend_from_slice(&chunk);
            }
            Some(Err(e)) => {
                if collected.is_empty() {
                    return Err(crate::Error::protocol(format!("stream reset: {e}")));
                }
                // Premature close with partial data: return what we have
                // (spec §4.9.2 step 5).
                break;
            }
            None => break,
        }
    }

    Ok(RawResponse {
        status,
        reason: None,
        headers,
        body: collected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_map_without_panicking() {
        let profile = Http2Profile {
            settings: vec![
                (SettingId::HeaderTableSize, 65536),
                (SettingId::EnablePush, 0),
                (SettingId::MaxConcurrentStreams, 100),
            ],
            pseudo_header_order: vec![],
            alpn: vec!["h2".to_string()],
        };
        let mut builder = h2::client::Builder::new();
        for (id, value) in &profile.settings {
            match id {
                SettingId::HeaderTableSize => {
                    builder.header_table_size(*value);
                }
                SettingId::EnablePush => {
                    builder.enable_push(*value != 0);
                }
                SettingId::MaxConcurrentStreams => {
                    builder.max_concurrent_streams(*value);
                }
                SettingId::InitialWindowSize => {
                    builder.initial_window_size(*value);
                }
                SettingId::MaxHeaderListSize => {
                    builder.max_header_list_size(*value);
                }
            }
        }
    }
}
