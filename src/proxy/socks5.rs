//! RFC 1928 / RFC 1929 SOCKS5 handshake (spec §4.6, §6, §8 scenario S6).
//!
//! Grounded on the wire shape of
//! `penumbra-x-rquest/src/core/client/connect/proxy/socks/v5/mod.rs`'s
//! state machine, flattened into a linear async function since specter
//! drives the handshake directly rather than through a `tower_service`
//! connector layer.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::ProxySpec;

const VERSION: u8 = 0x05;
const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USER_PASS: u8 = 0x02;
const METHOD_NO_ACCEPTABLE: u8 = 0xFF;

const CMD_CONNECT: u8 = 0x01;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Performs the RFC 1928 handshake plus RFC 1929 sub-negotiation (if
/// selected) and CONNECT, returning the stream ready to carry the
/// application protocol.
pub async fn handshake(
    mut stream: TcpStream,
    spec: &ProxySpec,
    target_host: &str,
    target_port: u16,
) -> crate::Result<TcpStream> {
    let ProxySpec::Socks5 {
        resolve_locally,
        credentials,
        ..
    } = spec
    else {
        unreachable!("socks5::handshake called with a non-SOCKS5 proxy spec")
    };

    greet(&mut stream, credentials.is_some()).await?;
    let method = read_method_selection(&mut stream).await?;

    match method {
        METHOD_NO_AUTH => {}
        METHOD_USER_PASS => {
            let (user, pass) = credentials
                .as_ref()
                .ok_or_else(|| crate::Error::proxy("server selected user/pass but no credentials configured"))?;
            authenticate(&mut stream, user, pass).await?;
        }
        METHOD_NO_ACCEPTABLE => {
            return Err(crate::Error::proxy("no acceptable authentication method"));
        }
        other => {
            return Err(crate::Error::proxy(format!(
                "server selected a method we did not offer: {other:#x}"
            )));
        }
    }

    connect(&mut stream, *resolve_locally, target_host, target_port).await?;
    Ok(stream)
}

async fn greet(stream: &mut TcpStream, have_credentials: bool) -> crate::Result<()> {
    let methods: &[u8] = if have_credentials {
        &[METHOD_NO_AUTH, METHOD_USER_PASS]
    } else {
        &[METHOD_NO_AUTH]
    };
    let mut req = vec![VERSION, methods.len() as u8];
    req.extend_from_slice(methods);
    stream.write_all(&req).await.map_err(crate::error::map_io)?;
    Ok(())
}

async fn read_method_selection(stream: &mut TcpStream) -> crate::Result<u8> {
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await.map_err(crate::error::map_io)?;
    if buf[0] != VERSION {
        return Err(crate::Error::proxy("unexpected SOCKS version in method selection"));
    }
    Ok(buf[1])
}

async fn authenticate(stream: &mut TcpStream, user: &str, pass: &str) -> crate::Result<()> {
    let mut req = vec![0x01u8, user.len() as u8];
    req.extend_from_slice(user.as_bytes());
    req.push(pass.len() as u8);
    req.extend_from_slice(pass.as_bytes());
    stream.write_all(&req).await.map_err(crate::error::map_io)?;

    let mut resp = [0u8; 2];
    stream.read_exact(&mut resp).await.map_err(crate::error::map_io)?;
    if resp[1] != 0x00 {
        return Err(crate::Error::proxy("SOCKS5 username/password authentication rejected"));
    }
    Ok(())
}

async fn connect(
    stream: &mut TcpStream,
    resolve_locally: bool,
    host: &str,
    port: u16,
) -> crate::Result<()> {
    let mut req = vec![VERSION, CMD_CONNECT, 0x00];

    if resolve_locally {
        let addr = super::resolve_ipv4_or_v6(host, port)?;
        match addr {
            std::net::SocketAddr::V4(v4) => {
                req.push(ATYP_IPV4);
                req.extend_from_slice(&v4.ip().octets());
            }
            std::net::SocketAddr::V6(v6) => {
                req.push(ATYP_IPV6);
                req.extend_from_slice(&v6.ip().octets());
            }
        }
    } else {
        req.push(ATYP_DOMAIN);
        req.push(host.len() as u8);
        req.extend_from_slice(host.as_bytes());
    }
    req.extend_from_slice(&port.to_be_bytes());

    stream.write_all(&req).await.map_err(crate::error::map_io)?;

    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.map_err(crate::error::map_io)?;
    if header[0] != VERSION {
        return Err(crate::Error::proxy("unexpected SOCKS version in CONNECT reply"));
    }
    reply_error(header[1])?;

    // The bound address must be fully consumed even though it is unused.
    match header[3] {
        ATYP_IPV4 => {
            let mut addr = [0u8; 4 + 2];
            stream.read_exact(&mut addr).await.map_err(crate::error::map_io)?;
        }
        ATYP_IPV6 => {
            let mut addr = [0u8; 16 + 2];
            stream.read_exact(&mut addr).await.map_err(crate::error::map_io)?;
        }
        ATYP_DOMAIN => {
            let mut len_buf = [0u8; 1];
            stream.read_exact(&mut len_buf).await.map_err(crate::error::map_io)?;
            let mut addr = vec![0u8; len_buf[0] as usize + 2];
            stream.read_exact(&mut addr).await.map_err(crate::error::map_io)?;
        }
        other => {
            return Err(crate::Error::proxy(format!(
                "unsupported address type in CONNECT reply: {other:#x}"
            )));
        }
    }

    Ok(())
}

fn reply_error(rep: u8) -> crate::Result<()> {
    let message = match rep {
        0x00 => return Ok(()),
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown SOCKS5 reply code",
    };
    Err(crate::Error::proxy(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_sends_ipv4_atyp_for_socks5() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut greeting = [0u8; 3];
            sock.read_exact(&mut greeting).await.unwrap();
            sock.write_all(&[0x05, 0x00]).await.unwrap();

            let mut header = [0u8; 4];
            sock.read_exact(&mut header).await.unwrap();
            assert_eq!(header, [0x05, 0x01, 0x00, 0x01]);
            let mut rest = [0u8; 4 + 2];
            sock.read_exact(&mut rest).await.unwrap();
            assert_eq!(&rest[..4], &[127, 0, 0, 1]);
            assert_eq!(u16::from_be_bytes([rest[4], rest[5]]), 80);

            sock.write_all(&[0x05, 0x00, 0x00, 0x01, 127, 0, 0, 1, 0x00, 0x50])
                .await
                .unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let spec = ProxySpec::Socks5 {
            host: addr.ip().to_string(),
            port: addr.port(),
            resolve_locally: true,
            credentials: None,
        };
        handshake(stream, &spec, "127.0.0.1", 80).await.unwrap();
        server.await.unwrap();
    }

    #[test]
    fn reply_codes_map_to_named_errors() {
        assert!(reply_error(0x00).is_ok());
        assert!(reply_error(0x02).is_err());
        assert!(reply_error(0x05).is_err());
    }
}
