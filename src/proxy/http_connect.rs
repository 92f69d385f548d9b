//! The HTTPS-through-HTTP-proxy error stub (spec §4.6, §6, §9 "Open
//! questions"). The absolute-form request target for plain HTTP through an
//! HTTP proxy is built directly in `executor::build_plan`; this module only
//! covers the documented CONNECT gap.

/// Returns the stub error for HTTPS-over-HTTP-proxy via CONNECT, which
/// this version does not implement (spec §9 "Open questions").
pub fn https_connect_unsupported() -> crate::Error {
    crate::Error::unsupported_scheme("https (CONNECT through an HTTP proxy is not implemented)")
}
