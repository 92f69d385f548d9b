//! Crate error type.
//!
//! A single opaque [`Error`] wraps a boxed `Inner` so that `Error` itself
//! stays pointer-sized no matter how many error kinds or optional fields
//! it grows, matching `penumbra-x-rquest/src/error.rs`'s boxed-inner shape.

use std::{error::Error as StdError, fmt, io, time::Duration};

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A boxed error type used for dynamic error handling.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The errors that may occur while building or executing a request.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    retry_after: Option<Duration>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
                retry_after: None,
            }),
        }
    }

    pub(crate) fn unknown_profile(name: impl Into<String>) -> Error {
        Error::new(Kind::UnknownProfile(name.into()), None::<Error>)
    }

    pub(crate) fn unsupported_scheme(scheme: impl Into<String>) -> Error {
        Error::new(Kind::UnsupportedScheme(scheme.into()), None::<Error>)
    }

    pub(crate) fn invalid_header<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::InvalidHeader, Some(e))
    }

    pub(crate) fn connect<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::TcpConnect, Some(e))
    }

    pub(crate) fn tls<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::Tls, Some(e))
    }

    pub(crate) fn proxy<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::ProxyNegotiation, Some(e))
    }

    pub(crate) fn protocol<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::Protocol, Some(e))
    }

    pub(crate) fn timeout<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::Timeout, Some(e))
    }

    pub(crate) fn http3_unavailable() -> Error {
        Error::new(Kind::Http3NotAvailable, None::<Error>)
    }

    pub(crate) fn rate_limited(retry_after: Duration) -> Error {
        let mut err = Error::new(Kind::RateLimitExceeded, None::<Error>);
        err.inner.retry_after = Some(retry_after);
        err
    }

    pub(crate) fn retry_exhausted<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::RetryExhausted, Some(e))
    }

    pub(crate) fn body<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::Body, Some(e))
    }

    pub(crate) fn decode<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::Decode, Some(e))
    }

    pub(crate) fn builder<E: Into<BoxError>>(e: E) -> Error {
        Error::new(Kind::Builder, Some(e))
    }

    /// Returns true if the error means the named profile/alias is unknown.
    pub fn is_unknown_profile(&self) -> bool {
        matches!(self.inner.kind, Kind::UnknownProfile(_))
    }

    /// Returns true if the error is an unsupported URL or proxy scheme.
    pub fn is_unsupported_scheme(&self) -> bool {
        matches!(self.inner.kind, Kind::UnsupportedScheme(_))
    }

    /// Returns true if the error is from connecting the underlying socket.
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::TcpConnect)
    }

    /// Returns true if the error is a TLS negotiation failure.
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::Tls)
    }

    /// Returns true if the error came from proxy negotiation (HTTP CONNECT
    /// rejection or a SOCKS5 handshake failure).
    pub fn is_proxy(&self) -> bool {
        matches!(self.inner.kind, Kind::ProxyNegotiation)
    }

    /// Returns true if the error is a malformed-wire-data protocol error.
    pub fn is_protocol(&self) -> bool {
        matches!(self.inner.kind, Kind::Protocol)
    }

    /// Returns true if the error is related to a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    /// Returns true if HTTP/3 was requested but is unavailable.
    pub fn is_http3_unavailable(&self) -> bool {
        matches!(self.inner.kind, Kind::Http3NotAvailable)
    }

    /// Returns true if a non-blocking rate limiter denied this call.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.inner.kind, Kind::RateLimitExceeded)
    }

    /// The number of seconds the caller should wait before retrying, if this
    /// error is [`Error::is_rate_limited`].
    pub fn retry_after(&self) -> Option<Duration> {
        self.inner.retry_after
    }

    /// Returns true if the retry controller exhausted `max_retries`.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self.inner.kind, Kind::RetryExhausted)
    }

    /// Returns true if the error is related to the request or response body.
    pub fn is_body(&self) -> bool {
        matches!(self.inner.kind, Kind::Body)
    }

    /// Returns true if the error is related to decoding the response body.
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }

    /// Returns true if the error is from the request/client builder.
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Classifies this error for the retry controller per spec §4.12: any
    /// connection/timeout/I/O failure class is retriable.
    pub(crate) fn is_retriable(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::TcpConnect | Kind::Tls | Kind::Timeout
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("specter::Error");
        builder.field("kind", &self.inner.kind);
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::UnknownProfile(name) => write!(f, "unknown browser profile: {name}")?,
            Kind::UnsupportedScheme(scheme) => write!(f, "unsupported scheme: {scheme}")?,
            Kind::InvalidHeader => f.write_str("invalid header value")?,
            Kind::TcpConnect => f.write_str("tcp connect error")?,
            Kind::Tls => f.write_str("tls negotiation error")?,
            Kind::ProxyNegotiation => f.write_str("proxy negotiation failed")?,
            Kind::Protocol => f.write_str("protocol error")?,
            Kind::Timeout => f.write_str("operation timed out")?,
            Kind::Http3NotAvailable => f.write_str("http/3 requested but not available")?,
            Kind::RateLimitExceeded => f.write_str("rate limit exceeded")?,
            Kind::RetryExhausted => f.write_str("retries exhausted")?,
            Kind::Body => f.write_str("request or response body error")?,
            Kind::Decode => f.write_str("error decoding response body")?,
            Kind::Builder => f.write_str("builder error")?,
        }
        if let Some(e) = &self.inner.source {
            write!(f, ": {e}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    UnknownProfile(String),
    UnsupportedScheme(String),
    InvalidHeader,
    TcpConnect,
    Tls,
    ProxyNegotiation,
    Protocol,
    Timeout,
    Http3NotAvailable,
    RateLimitExceeded,
    RetryExhausted,
    Body,
    Decode,
    Builder,
}

/// Maps a plain [`io::Error`] into the request-kind `Error`, matching the
/// teacher's `map_timeout_to_request_error` helper for I/O boundary errors.
pub(crate) fn map_io(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::TimedOut {
        Error::timeout(e)
    } else {
        Error::connect(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn error_is_send_sync_and_pointer_sized() {
        assert_send::<Error>();
        assert_sync::<Error>();
        assert_eq!(std::mem::size_of::<Error>(), std::mem::size_of::<usize>());
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let err = Error::rate_limited(Duration::from_millis(250));
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn retriable_classification() {
        assert!(Error::connect("boom").is_retriable());
        assert!(Error::tls("boom").is_retriable());
        assert!(Error::timeout("boom").is_retriable());
        assert!(!Error::protocol("boom").is_retriable());
        assert!(!Error::unknown_profile("x").is_retriable());
    }
}
