//! C9: the per-protocol wire transports (spec §4.9).
//!
//! Each transport takes a negotiated [`crate::conn::Conn`] plus a
//! [`RequestPlan`] and returns a [`RawResponse`]. Dispatch by negotiated
//! ALPN happens in the executor (spec §4.13 step 6); this module only
//! knows how to speak each protocol over an already-open stream.

pub mod h1;
pub mod h2;
#[cfg(feature = "http3")]
pub mod h3;

use crate::header::OrderedHeaders;

/// Everything a transport needs to write a request, already resolved by
/// the executor: method, target, ordered headers, and an encoded body.
pub struct RequestPlan {
    pub method: String,
    pub authority: String,
    pub path_and_query: String,
    pub headers: OrderedHeaders,
    pub body: Vec<u8>,
}

/// The wire response, before decompression (spec §4.5 runs after this).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// The status-line reason phrase, when the protocol carries one
    /// (HTTP/1.1 only; H2/H3 have no reason phrase).
    pub reason: Option<String>,
    pub headers: OrderedHeaders,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the response asked for the connection to be closed rather
    /// than returned to the pool (spec §4.9.1).
    pub(crate) fn wants_close(&self) -> bool {
        self.header("connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }
}
