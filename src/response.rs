//! The public [`Response`] value (spec §3 "Response").
//!
//! Grounded on `penumbra-x-rquest/src/async_impl/response.rs`'s status/
//! header/body accessor surface, rebuilt atop specter's own
//! [`RawResponse`](crate::transport::RawResponse) instead of hyper's
//! response type.

use crate::header::OrderedHeaders;
use crate::transport::RawResponse;

/// The HTTP version a response (or a connection) negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http1,
    Http2,
    Http3,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Http1 => "1.1",
            Version::Http2 => "2",
            Version::Http3 => "3",
        }
    }
}

/// A completed response: status, headers in wire order, and a body
/// already decompressed per spec §4.5.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    reason: Option<String>,
    version: Version,
    headers: OrderedHeaders,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn from_raw(raw: RawResponse, version: Version, body: Vec<u8>) -> Response {
        Response {
            status: raw.status,
            reason: raw.reason,
            version,
            headers: raw.headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Headers in wire order (spec §3: "preserved in wire order").
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive single-header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn text(&self) -> crate::Result<String> {
        String::from_utf8(self.body.clone()).map_err(crate::Error::decode)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_slice(&self.body).map_err(crate::Error::decode)
    }

    /// Every `Set-Cookie` header's raw value (spec §4.14, §6: name=value
    /// extraction happens one layer up in [`crate::cookie`]).
    pub(crate) fn set_cookie_headers(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Response {
        Response::from_raw(
            RawResponse {
                status: 200,
                reason: Some("OK".to_string()),
                headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
                body: vec![],
            },
            Version::Http1,
            b"hello".to_vec(),
        )
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let resp = sample();
        assert_eq!(resp.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn text_decodes_utf8_body() {
        let resp = sample();
        assert_eq!(resp.text().unwrap(), "hello");
    }
}
