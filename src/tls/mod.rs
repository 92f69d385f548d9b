//! C8: the TLS shaper (spec §4.7).
//!
//! Wraps a raw socket with a BoringSSL context configured from the
//! resolved profile: cipher list, ALPN, curves, with the degraded-context
//! retry the spec requires when the local TLS stack rejects a setting.
//! Grounded on `penumbra-x-rquest/src/tls/mod.rs`'s `BoringTlsConnector`
//! and its `SslConnectorBuilderExt` configuration chain.

use boring::ssl::{SslConnector, SslMethod, SslVerifyMode};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

use crate::profile::Profile;

/// Negotiated TLS outcome, fed into transport selection (spec §4.7: "after
/// a successful handshake, record the negotiated ALPN; it selects the
/// transport").
#[derive(Debug, Clone)]
pub struct NegotiatedTls {
    pub alpn: Option<String>,
    pub cipher: Option<String>,
}

/// Shapes and performs the TLS handshake over `stream` using `profile`.
/// `verify` disables both hostname checking and certificate verification
/// when `false` (spec §4.7). On handshake failure, closes the socket,
/// re-dials TCP, and retries the handshake once with a fresh unconfigured
/// default context; a second failure surfaces `TLSNegotiationError`.
pub async fn handshake(
    host: &str,
    port: u16,
    stream: TcpStream,
    profile: &Profile,
    verify: bool,
) -> crate::Result<(SslStream<TcpStream>, NegotiatedTls)> {
    match try_handshake(host, stream, profile, verify).await {
        Ok(negotiated) => Ok(negotiated),
        Err(first_err) => {
            log::warn!("TLS handshake failed with shaped context, retrying with defaults: {first_err}");
            let fresh = TcpStream::connect((host, port))
                .await
                .map_err(crate::Error::connect)?;
            try_handshake_default(host, fresh, verify)
                .await
                .map_err(|_| crate::Error::tls(first_err))
        }
    }
}

async fn try_handshake(
    host: &str,
    stream: TcpStream,
    profile: &Profile,
    verify: bool,
) -> crate::Result<(SslStream<TcpStream>, NegotiatedTls)> {
    let mut builder = SslConnector::builder(SslMethod::tls_client()).map_err(crate::Error::tls)?;

    if verify {
        builder.set_verify(SslVerifyMode::PEER);
    } else {
        builder.set_verify(SslVerifyMode::NONE);
    }

    let alpn = if !profile.tls.alpn.is_empty() {
        &profile.tls.alpn
    } else {
        &profile.http2.alpn
    };
    if !alpn.is_empty() {
        if let Ok(wire) = encode_alpn_wire_format(alpn) {
            // A local stack that rejects the ALPN extension outright is
            // tolerated silently per spec §4.7.
            let _ = builder.set_alpn_protos(&wire);
        }
    }

    if !profile.tls.ciphers.is_empty() {
        let cipher_list = profile.tls.ciphers.join(":");
        if builder.set_cipher_list(&cipher_list).is_err() {
            log::warn!("profile cipher list rejected by local TLS stack, falling back to DEFAULT");
            let _ = builder.set_cipher_list("DEFAULT:@SECLEVEL=1");
        }
    }

    if let Some(curve_name) = profile.tls.curves.first() {
        let _ = apply_first_curve(&mut builder, curve_name);
    }

    let connector = builder.build();
    let config = connector
        .configure()
        .map_err(crate::Error::tls)?;

    let ssl_stream = tokio_boring::connect(config, host, stream)
        .await
        .map_err(crate::Error::tls)?;

    let negotiated = NegotiatedTls {
        alpn: ssl_stream
            .ssl()
            .selected_alpn_protocol()
            .map(|b| String::from_utf8_lossy(b).into_owned()),
        cipher: ssl_stream.ssl().current_cipher().map(|c| c.name().to_string()),
    };

    Ok((ssl_stream, negotiated))
}

async fn try_handshake_default(
    host: &str,
    stream: TcpStream,
    verify: bool,
) -> crate::Result<(SslStream<TcpStream>, NegotiatedTls)> {
    let mut builder = SslConnector::builder(SslMethod::tls_client()).map_err(crate::Error::tls)?;
    if !verify {
        builder.set_verify(SslVerifyMode::NONE);
    }
    let connector = builder.build();
    let config = connector.configure().map_err(crate::Error::tls)?;
    let ssl_stream = tokio_boring::connect(config, host, stream)
        .await
        .map_err(crate::Error::tls)?;
    let negotiated = NegotiatedTls {
        alpn: ssl_stream
            .ssl()
            .selected_alpn_protocol()
            .map(|b| String::from_utf8_lossy(b).into_owned()),
        cipher: ssl_stream.ssl().current_cipher().map(|c| c.name().to_string()),
    };
    Ok((ssl_stream, negotiated))
}

fn apply_first_curve(builder: &mut boring::ssl::SslConnectorBuilder, name: &str) -> Result<(), ()> {
    use boring::ssl::SslCurve;
    let curve = match name {
        "X25519" => SslCurve::X25519,
        "secp256r1" => SslCurve::SECP256R1,
        "secp384r1" => SslCurve::SECP384R1,
        "secp521r1" => SslCurve::SECP521R1,
        _ => return Err(()),
    };
    builder.set_curves(&[curve]).map_err(|_| ())
}

/// Encodes an ordered ALPN protocol list into BoringSSL's
/// length-prefixed wire format.
fn encode_alpn_wire_format(protos: &[String]) -> Result<Vec<u8>, ()> {
    let mut out = Vec::new();
    for proto in protos {
        let bytes = proto.as_bytes();
        if bytes.len() > 255 {
            return Err(());
        }
        out.push(bytes.len() as u8);
        out.extend_from_slice(bytes);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpn_wire_format_length_prefixes_each_token() {
        let wire = encode_alpn_wire_format(&["h2".to_string(), "http/1.1".to_string()]).unwrap();
        assert_eq!(wire, b"\x02h2\x08http/1.1");
    }
}
