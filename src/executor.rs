//! C14: the request executor (spec §4.13).
//!
//! Orchestrates the rate limiter, header/body encoders, H3-with-fallback
//! attempt, connection pool, and transport dispatch into the single
//! per-call pipeline the spec lays out as eight ordered steps. Grounded on
//! `penumbra-x-rquest/src/client/http.rs`'s `execute_request`, rebuilt
//! around specter's own pool/transport types instead of `hyper::Client`.

use std::time::Duration;

use crate::client::ClientInner;
use crate::compress;
use crate::conn::{Conn, Protocol};
use crate::header;
use crate::into_url::{self, ParsedUrl};
use crate::pool::PoolKey;
use crate::proxy::{self, http_connect, ProxySpec};
use crate::ratelimit::TokenBucket;
use crate::request::Request;
use crate::response::{Response, Version};
use crate::retry;
use crate::tls;
use crate::transport::{h1, h2, RawResponse, RequestPlan};

/// Runs the retry loop (which itself re-acquires rate-limit tokens on every
/// attempt, per spec §5: "retry/backoff happens outside rate-limiting") and
/// wraps the final wire response into a [`Response`].
pub(crate) async fn execute(client: &ClientInner, request: Request) -> crate::Result<Response> {
    let parsed = into_url::parse_url(&request.url)?;

    let mut version = Version::Http1;
    let raw = retry::with_retry(client.max_retries, client.backoff, || {
        execute_once(client, &request, &parsed, &mut version)
    })
    .await?;

    let body = decode_if_enabled(client, &raw).await;
    Ok(Response::from_raw(raw, version, body))
}

/// Opens a [`crate::StreamingResponse`] instead of buffering the whole
/// body (spec §4.10). Always dials a fresh connection rather than
/// borrowing from the pool: the stream takes unique ownership of the
/// socket and never gives it back, so pulling a reusable idle connection
/// out of the pool for a one-shot read would only shrink it for no
/// benefit. No rate limiting, retry, H3, or auto-decompress applies here
/// (spec §9: streaming does not auto-decompress).
pub(crate) async fn execute_streaming(
    client: &ClientInner,
    request: Request,
) -> crate::Result<crate::stream::StreamingResponse> {
    let parsed = into_url::parse_url(&request.url)?;
    let proxy = effective_proxy(client, &request)?;
    let plan = build_plan(client, &request, &parsed, proxy.as_ref())?;
    let timeout = effective_timeout(client, &request);
    let conn = dial(client, &parsed, proxy.as_ref(), timeout).await?;
    crate::stream::StreamingResponse::open(conn, &plan).await
}

/// The per-call timeout governing TLS handshake, H1/H2 reads/writes, and H3
/// completion (spec §5): a request-level override takes precedence over the
/// client's configured `timeout`. The TCP connect leg uses `connect_timeout`
/// instead, applied separately in [`dial`].
fn effective_timeout(client: &ClientInner, request: &Request) -> Duration {
    request.timeout.unwrap_or(client.timeout)
}

/// Steps 1-7 of spec §4.13: rate-limit acquisition, plan construction, the
/// H3-with-fallback attempt, and H1/H2 dispatch through the pool.
async fn execute_once(
    client: &ClientInner,
    request: &Request,
    parsed: &ParsedUrl,
    version: &mut Version,
) -> crate::Result<RawResponse> {
    if let Some(limiter) = &client.global_limiter {
        limiter.acquire_blocking(1.0).await;
    }
    if let Some((capacity, rate)) = client.per_host_rate {
        acquire_per_host_rate(client, &parsed.host, capacity, rate).await;
    }

    let proxy = effective_proxy(client, request)?;
    let plan = build_plan(client, request, parsed, proxy.as_ref())?;
    let timeout = effective_timeout(client, request);

    #[cfg(feature = "http3")]
    if proxy.is_none() {
        if let Some(raw) = try_http3(client, parsed, &plan, timeout).await? {
            *version = Version::Http3;
            return Ok(raw);
        }
    }

    let key = PoolKey {
        scheme: if parsed.scheme.is_https() { "https" } else { "http" }.to_string(),
        host: parsed.host.clone(),
        port: parsed.port,
        proxy: proxy.as_ref().map(|_| "proxy".to_string()),
    };

    let mut conn = match client.pool.acquire(&key) {
        Some(conn) => conn,
        None => dial(client, parsed, proxy.as_ref(), timeout).await?,
    };

    *version = match conn.protocol() {
        Protocol::Http2 => Version::Http2,
        _ => Version::Http1,
    };

    let result = tokio::time::timeout(timeout, dispatch(&mut conn, &plan))
        .await
        .unwrap_or_else(|_| Err(crate::Error::timeout("read/write timed out")));

    match result {
        Ok(raw) if raw.wants_close() => {
            conn.close();
            Ok(raw)
        }
        Ok(raw) => {
            client.pool.release(key, conn);
            Ok(raw)
        }
        Err(e) => {
            conn.close();
            Err(e)
        }
    }
}

/// Gets or creates the per-host bucket and waits on it. The map lock is
/// dropped before awaiting: `TokenBucket` carries its own internal lock for
/// the actual wait, so the `Arc` clone is all this needs to hold.
async fn acquire_per_host_rate(client: &ClientInner, host: &str, capacity: f64, rate: f64) {
    let bucket = {
        let mut limiters = client.per_host_limiters.lock().expect("rate limiter mutex poisoned");
        limiters
            .entry(host.to_string())
            .or_insert_with(|| std::sync::Arc::new(TokenBucket::new(capacity, rate)))
            .clone()
    };
    bucket.acquire_blocking(1.0).await;
}

async fn decode_if_enabled(client: &ClientInner, raw: &RawResponse) -> Vec<u8> {
    if !client.auto_decompress {
        return raw.body.clone();
    }
    match raw.header("content-encoding") {
        Some(encoding) if !encoding.is_empty() => {
            compress::decode_body(raw.body.clone(), encoding).await
        }
        _ => raw.body.clone(),
    }
}

/// Resolves the proxy to use for `request`: a per-call override (spec §3's
/// Request Plan carries its own proxy specification) takes precedence over
/// the client's configured proxy.
fn effective_proxy(client: &ClientInner, request: &Request) -> crate::Result<Option<ProxySpec>> {
    match &request.proxy_override {
        Some(url) => Ok(Some(ProxySpec::parse(url)?)),
        None => Ok(client.proxy.clone()),
    }
}

fn build_plan(
    client: &ClientInner,
    request: &Request,
    parsed: &ParsedUrl,
    proxy: Option<&ProxySpec>,
) -> crate::Result<RequestPlan> {
    let mut user: Vec<(String, String)> = request.headers.clone();

    let default_port = parsed.scheme.default_port();
    let host_header = if parsed.port == default_port {
        parsed.host.clone()
    } else {
        format!("{}:{}", parsed.host, parsed.port)
    };
    header::insert_if_absent(&mut user, "Host", host_header);

    if !header::has(&user, "accept-encoding") {
        let profile_value = client
            .profile
            .headers
            .default
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("accept-encoding"))
            .map(|(_, v)| v.as_str());
        header::insert_if_absent(
            &mut user,
            "Accept-Encoding",
            client.accepts.header_value(client.auto_decompress, profile_value),
        );
    }

    let encoded = crate::body::encode(request.body.clone(), &request.method)?;
    if let Some(content_type) = &encoded.content_type {
        header::insert_if_absent(&mut user, "Content-Type", content_type.clone());
    }
    if let Some(len) = encoded.content_length {
        header::upsert(&mut user, "Content-Length", len.to_string());
    }

    let mut headers = header::canonicalize(
        &client.profile.headers.default,
        Some(&user),
        &client.profile.headers.order,
    );
    header::ensure_keep_alive(&mut headers);

    // An HTTP proxy wants the absolute-form request target (spec §4.6,
    // §9); HTTPS through an HTTP proxy would need CONNECT, which is the
    // documented gap this version does not implement.
    let path_and_query = match proxy {
        Some(ProxySpec::Http { .. }) if parsed.scheme.is_https() => {
            return Err(http_connect::https_connect_unsupported());
        }
        Some(ProxySpec::Http { .. }) => {
            format!("http://{}:{}{}", parsed.host, parsed.port, parsed.path_and_query)
        }
        _ => parsed.path_and_query.clone(),
    };

    Ok(RequestPlan {
        method: request.method.clone(),
        authority: parsed.host.clone(),
        path_and_query,
        headers,
        body: encoded.bytes,
    })
}

async fn dial(
    client: &ClientInner,
    parsed: &ParsedUrl,
    proxy: Option<&ProxySpec>,
    timeout: Duration,
) -> crate::Result<Conn> {
    let stream = tokio::time::timeout(client.connect_timeout, proxy::dial(&parsed.host, parsed.port, proxy))
        .await
        .unwrap_or_else(|_| Err(crate::Error::timeout("connect timed out")))?;

    if parsed.scheme.is_https() {
        let (tls_stream, negotiated) = tokio::time::timeout(
            timeout,
            tls::handshake(&parsed.host, parsed.port, stream, &client.profile, client.verify),
        )
        .await
        .unwrap_or_else(|_| Err(crate::Error::timeout("tls handshake timed out")))?;
        match negotiated.alpn.as_deref() {
            Some("h2") => {
                let send_request = h2::handshake(tls_stream, &client.profile.http2).await?;
                Ok(Conn::new_h2(send_request))
            }
            _ => Ok(Conn::new_h1(tls_stream)),
        }
    } else {
        Ok(Conn::new_h1(stream))
    }
}

async fn dispatch(conn: &mut Conn, plan: &RequestPlan) -> crate::Result<RawResponse> {
    match conn.protocol() {
        Protocol::Http2 => {
            let send_request = conn
                .h2_sender()
                .ok_or_else(|| crate::Error::protocol("h2 connection missing its sender"))?;
            h2::send(send_request, plan).await
        }
        Protocol::Http1 => {
            let io = conn
                .as_h1_mut()
                .ok_or_else(|| crate::Error::protocol("h1 dispatch on a non-h1 connection"))?;
            h1::send(io, plan).await
        }
        Protocol::Http3 => Err(crate::Error::protocol("h3 connections are not pooled")),
    }
}

#[cfg(feature = "http3")]
async fn try_http3(
    client: &ClientInner,
    parsed: &ParsedUrl,
    plan: &RequestPlan,
    timeout: Duration,
) -> crate::Result<Option<RawResponse>> {
    use crate::transport::h3;

    if !client.http3_enabled || client.proxy.is_some() || !parsed.scheme.is_https() {
        return Ok(None);
    }
    let Some(h3_profile) = &client.profile.http3 else {
        return Ok(None);
    };

    let already_failed = client
        .h3_failed_hosts
        .lock()
        .expect("h3 failed-hosts mutex poisoned")
        .contains(&parsed.host);
    if already_failed {
        return Ok(None);
    }

    let key = (parsed.host.clone(), parsed.port);

    if !client
        .h3_sessions
        .lock()
        .expect("h3 session mutex poisoned")
        .contains_key(&key)
    {
        match h3::connect(&parsed.host, parsed.port, h3_profile, client.verify).await {
            Ok(session) => {
                client
                    .h3_sessions
                    .lock()
                    .expect("h3 session mutex poisoned")
                    .insert(key.clone(), session);
            }
            Err(e) => return on_h3_failure(client, &parsed.host, &key, e),
        }
    }

    let attempt = {
        let mut sessions = client.h3_sessions.lock().expect("h3 session mutex poisoned");
        let session = sessions.get_mut(&key).expect("just inserted or already present");
        tokio::time::timeout(timeout, h3::send(session, plan))
            .await
            .unwrap_or_else(|_| Err(crate::Error::timeout("h3 response completion timed out")))
    };

    match attempt {
        Ok(raw) => Ok(Some(raw)),
        Err(e) => on_h3_failure(client, &parsed.host, &key, e),
    }
}

#[cfg(feature = "http3")]
fn on_h3_failure(
    client: &ClientInner,
    host: &str,
    key: &(String, u16),
    e: crate::Error,
) -> crate::Result<Option<RawResponse>> {
    if !client.http3_fallback {
        return Err(e);
    }
    client
        .h3_failed_hosts
        .lock()
        .expect("h3 failed-hosts mutex poisoned")
        .insert(host.to_string());
    client
        .h3_sessions
        .lock()
        .expect("h3 session mutex poisoned")
        .remove(key);
    log::debug!("h3 attempt failed for {host}, falling back to h1/h2: {e}");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientBuilder;

    #[test]
    fn host_header_defaults_to_url_authority() {
        let client = ClientBuilder::new().impersonate("chrome-120").build().unwrap();
        let url = url::Url::parse("http://example.com/a").unwrap();
        let request = Request::new("GET", url.clone());
        let parsed = into_url::parse_url(&url).unwrap();
        let plan = build_plan(client.inner(), &request, &parsed, None).unwrap();
        assert!(plan
            .headers
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case("host") && v == "example.com"));
    }

    #[test]
    fn non_default_port_is_included_in_host_header() {
        let client = ClientBuilder::new().impersonate("chrome-120").build().unwrap();
        let url = url::Url::parse("http://example.com:8080/a").unwrap();
        let request = Request::new("GET", url.clone());
        let parsed = into_url::parse_url(&url).unwrap();
        let plan = build_plan(client.inner(), &request, &parsed, None).unwrap();
        assert!(plan
            .headers
            .iter()
            .any(|(n, v)| n.eq_ignore_ascii_case("host") && v == "example.com:8080"));
    }

    #[test]
    fn http_proxy_rewrites_path_to_absolute_form() {
        let client = ClientBuilder::new().impersonate("chrome-120").build().unwrap();
        let url = url::Url::parse("http://example.com/a?b=c").unwrap();
        let request = Request::new("GET", url.clone());
        let parsed = into_url::parse_url(&url).unwrap();
        let proxy = ProxySpec::Http {
            host: "proxy.local".to_string(),
            port: 3128,
        };
        let plan = build_plan(client.inner(), &request, &parsed, Some(&proxy)).unwrap();
        assert_eq!(plan.path_and_query, "http://example.com:80/a?b=c");
    }

    #[test]
    fn https_through_http_proxy_is_rejected() {
        let client = ClientBuilder::new().impersonate("chrome-120").build().unwrap();
        let url = url::Url::parse("https://example.com/a").unwrap();
        let request = Request::new("GET", url.clone());
        let parsed = into_url::parse_url(&url).unwrap();
        let proxy = ProxySpec::Http {
            host: "proxy.local".to_string(),
            port: 3128,
        };
        let err = build_plan(client.inner(), &request, &parsed, Some(&proxy)).unwrap_err();
        assert!(err.is_unsupported_scheme());
    }

    #[test]
    fn per_request_timeout_override_takes_precedence_over_client_timeout() {
        let client = ClientBuilder::new()
            .impersonate("chrome-120")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let url = url::Url::parse("http://example.com/a").unwrap();
        let mut request = Request::new("GET", url);
        request.timeout = Some(Duration::from_millis(50));

        assert_eq!(effective_timeout(client.inner(), &request), Duration::from_millis(50));
    }

    #[test]
    fn effective_timeout_falls_back_to_client_timeout() {
        let client = ClientBuilder::new()
            .impersonate("chrome-120")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let url = url::Url::parse("http://example.com/a").unwrap();
        let request = Request::new("GET", url);

        assert_eq!(effective_timeout(client.inner(), &request), Duration::from_secs(30));
    }

    #[test]
    fn per_request_proxy_override_takes_precedence_over_client_proxy() {
        let client = ClientBuilder::new()
            .impersonate("chrome-120")
            .proxy("http://client-proxy.local:8080")
            .build()
            .unwrap();
        let url = url::Url::parse("http://example.com/a").unwrap();
        let mut request = Request::new("GET", url);
        request.proxy_override = Some(url::Url::parse("http://override-proxy.local:9090").unwrap());

        let proxy = effective_proxy(client.inner(), &request).unwrap().unwrap();
        assert_eq!(
            proxy,
            ProxySpec::Http {
                host: "override-proxy.local".to_string(),
                port: 9090,
            }
        );
    }
}
