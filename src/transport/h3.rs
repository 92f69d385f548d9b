//! HTTP/3 transport (spec §4.9.3), feature-gated behind `http3`.
//!
//! Grounded on `MikkoParkkola-nab/src/http3_client.rs`'s `quinn` + `h3` +
//! `h3-quinn` pairing: a QUIC endpoint negotiates ALPN `h3`, `h3::client`
//! drives HTTP/3 framing over it, with the connection driver spawned as a
//! background task per the same pattern.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Buf;
use http::Request;

use crate::profile::Http3Profile;

use super::{RawResponse, RequestPlan};

/// A cached HTTP/3 session for one `(host, port)`, owned by the client's
/// session cache (spec §4.9.3, §9 "Cyclic reference").
pub struct H3Session {
    send_request: h3::client::SendRequest<h3_quinn::OpenStreams, bytes::Bytes>,
}

/// Opens a fresh QUIC connection and HTTP/3 session to `(host, port)`,
/// shaped from `profile` (flow-control windows) with `verify` controlling
/// certificate validation.
pub async fn connect(
    host: &str,
    port: u16,
    profile: &Http3Profile,
    verify: bool,
) -> crate::Result<H3Session> {
    let mut roots = rustls::RootCertStore::empty();
    if verify {
        for cert in rustls_native_certs_fallback() {
            let _ = roots.add(&cert);
        }
    }

    let mut tls_config = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();
    tls_config.alpn_protocols = vec![b"h3".to_vec()];
    if !verify {
        tls_config
            .dangerous()
            .set_certificate_verifier(Arc::new(danger::NoVerifier));
    }

    let mut transport = quinn::TransportConfig::default();
    transport.max_idle_timeout(
        Duration::from_secs(profile.idle_timeout_secs)
            .try_into()
            .ok(),
    );
    transport.stream_receive_window(profile.max_stream_data.try_into().unwrap_or(u32::MAX).into());
    transport.receive_window(profile.max_data.try_into().unwrap_or(u32::MAX).into());

    let mut client_config = quinn::ClientConfig::new(Arc::new(tls_config));
    client_config.transport_config(Arc::new(transport));

    let mut endpoint =
        quinn::Endpoint::client("0.0.0.0:0".parse::<SocketAddr>().unwrap()).map_err(crate::Error::connect)?;
    endpoint.set_default_client_config(client_config);

    let addr = tokio::net::lookup_host((host, port))
        .await
        .map_err(crate::error::map_io)?
        .next()
        .ok_or_else(|| crate::Error::connect("no addresses resolved for h3 endpoint"))?;

    let connecting = endpoint
        .connect(addr, host)
        .map_err(|e| crate::Error::connect(e.to_string()))?;
    let connection = connecting.await.map_err(crate::Error::connect)?;

    let (mut driver, send_request) = h3::client::new(h3_quinn::Connection::new(connection))
        .await
        .map_err(|e| crate::Error::protocol(e.to_string()))?;

    tokio::spawn(async move {
        let result = futures_util::future::poll_fn(|cx| driver.poll_close(cx)).await;
        log::debug!("h3 driver closed: {result:?}");
    });

    Ok(H3Session { send_request })
}

/// Sends one request over an established H3 session (spec §4.9.3).
pub async fn send(session: &mut H3Session, plan: &RequestPlan) -> crate::Result<RawResponse> {
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

    let mut stream = session
        .send_request
        .send_request(request)
        .await
        .map_err(|e| crate::Error::protocol(e.to_string()))?;

    if !plan.body.is_empty() {
        stream
            .send_data(bytes::Bytes::copy_from_slice(&plan.body))
            .await
            .map_err(|e| crate::Error::protocol(e.to_string()))?;
    }
    stream.finish().await.map_err(|e| crate::Error::protocol(e.to_string()))?;

    let response = stream
        .recv_response()
        .await
        .map_err(|e| crate::Error::protocol(e.to_string()))?;

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

    let mut body = Vec::new();
    while let Some(mut chunk) = stream
        .recv_data()
        .await
        .map_err(|e| crate::Error::protocol(e.to_string()))?
    {
        while chunk.has_remaining() {
            let n = chunk.chunk().len();
            body.extend_from_slice(chunk.chunk());
            chunk.advance(n);
        }
    }

    Ok(RawResponse {
        status,
        reason: None,
        headers,
        body,
    })
}

fn rustls_native_certs_fallback() -> Vec<rustls::Certificate> {
    rustls_native_certs::load_native_certs().unwrap_or_default()
}

mod danger {
    use rustls::client::{ServerCertVerified, ServerCertVerifier};

    pub(super) struct NoVerifier;

    impl ServerCertVerifier for NoVerifier {
        fn verify_server_cert(
            &self,
            _end_entity: &rustls::Certificate,
            _intermediates: &[rustls::Certificate],
            _server_name: &rustls::client::ServerName,
            _scts: &mut dyn Iterator<Item = &[u8]>,
            _ocsp_response: &[u8],
            _now: std::time::SystemTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }
    }
}
