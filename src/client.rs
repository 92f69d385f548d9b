//! C14's public surface: [`Client`] and [`ClientBuilder`] (spec §4.13).
//!
//! Grounded on `penumbra-x-rquest/src/client/http.rs`'s `Client`/
//! `ClientBuilder` split: an `Arc`-shared inner holds the resolved
//! profile, pool, and governance state; the builder resolves the profile
//! and overlays once at `build()` time (spec §4.1).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::compress::Accepts;
use crate::into_url::IntoUrl;
use crate::pool::Pool;
use crate::profile::{self, ExtraFingerprint, Ja3Overlay, Profile};
use crate::proxy::ProxySpec;
use crate::ratelimit::TokenBucket;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::retry::Backoff;

#[cfg(feature = "http3")]
use crate::transport::h3::H3Session;

pub(crate) struct ClientInner {
    pub(crate) profile: Profile,
    pub(crate) pool: Pool,
    pub(crate) proxy: Option<ProxySpec>,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) accepts: Accepts,
    pub(crate) auto_decompress: bool,
    pub(crate) verify: bool,
    pub(crate) global_limiter: Option<TokenBucket>,
    pub(crate) per_host_rate: Option<(f64, f64)>,
    pub(crate) per_host_limiters: Mutex<HashMap<String, Arc<TokenBucket>>>,
    pub(crate) max_retries: u32,
    pub(crate) backoff: Backoff,
    pub(crate) http3_enabled: bool,
    pub(crate) http3_fallback: bool,
    pub(crate) h3_failed_hosts: Mutex<HashSet<String>>,
    #[cfg(feature = "http3")]
    pub(crate) h3_sessions: Mutex<HashMap<(String, u16), H3Session>>,
}

/// A faithfully-impersonating HTTP client (spec §1). Cheap to clone: the
/// inner state is `Arc`-shared, matching the teacher's `Client`.
#[derive(Clone)]
pub struct Client {
    inner: std::sync::Arc<ClientInner>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder::new(self.clone(), "GET", url)
    }

    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder::new(self.clone(), "POST", url)
    }

    pub fn put(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder::new(self.clone(), "PUT", url)
    }

    pub fn delete(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder::new(self.clone(), "DELETE", url)
    }

    pub fn head(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder::new(self.clone(), "HEAD", url)
    }

    pub fn request(&self, method: &str, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url)
    }

    pub(crate) async fn execute(&self, request: crate::request::Request) -> crate::Result<Response> {
        crate::executor::execute(&self.inner, request).await
    }

    pub(crate) async fn execute_streaming(
        &self,
        request: crate::request::Request,
    ) -> crate::Result<crate::StreamingResponse> {
        crate::executor::execute_streaming(&self.inner, request).await
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &ClientInner {
        &self.inner
    }

    /// Closes every pooled connection and H3 session (spec §4.14, §9
    /// "Cyclic reference").
    pub fn close(&self) {
        self.inner.pool.close();
        #[cfg(feature = "http3")]
        {
            self.inner.h3_sessions.lock().expect("h3 session mutex poisoned").clear();
        }
    }
}

/// Builds a [`Client`], resolving the chosen browser profile and any
/// overlays once (spec §4.1).
pub struct ClientBuilder {
    profile_name: String,
    ja3: Option<Ja3Overlay>,
    extra_fp: Option<ExtraFingerprint>,
    force_http1: bool,
    proxy: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    max_idle_per_host: usize,
    auto_decompress: bool,
    verify: bool,
    global_rate: Option<(f64, f64)>,
    per_host_rate: Option<(f64, f64)>,
    max_retries: u32,
    backoff: Backoff,
    http3: bool,
    http3_fallback: bool,
}

impl Default for ClientBuilder {
    fn default() -> ClientBuilder {
        ClientBuilder {
            profile_name: "chrome-120".to_string(),
            ja3: None,
            extra_fp: None,
            force_http1: false,
            proxy: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_idle_per_host: 4,
            auto_decompress: true,
            verify: true,
            global_rate: None,
            per_host_rate: None,
            max_retries: 0,
            backoff: Backoff::default(),
            http3: false,
            http3_fallback: true,
        }
    }
}

impl ClientBuilder {
    pub fn new() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn impersonate(mut self, profile_name: impl Into<String>) -> ClientBuilder {
        self.profile_name = profile_name.into();
        self
    }

    pub fn ja3(mut self, overlay: Ja3Overlay) -> ClientBuilder {
        self.ja3 = Some(overlay);
        self
    }

    pub fn extra_fingerprint(mut self, overlay: ExtraFingerprint) -> ClientBuilder {
        self.extra_fp = Some(overlay);
        self
    }

    pub fn force_http1(mut self, force: bool) -> ClientBuilder {
        self.force_http1 = force;
        self
    }

    pub fn proxy(mut self, proxy_url: impl Into<String>) -> ClientBuilder {
        self.proxy = Some(proxy_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> ClientBuilder {
        self.timeout = timeout;
        self
    }

    /// Bounds the TCP connect leg only (spec §5's "(a) TCP connect"),
    /// separately from the overall per-call `timeout`.
    pub fn connect_timeout(mut self, timeout: Duration) -> ClientBuilder {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_idle_per_host(mut self, max: usize) -> ClientBuilder {
        self.max_idle_per_host = max;
        self
    }

    pub fn auto_decompress(mut self, enabled: bool) -> ClientBuilder {
        self.auto_decompress = enabled;
        self
    }

    /// Disables TLS certificate and hostname verification (spec §4.7).
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> ClientBuilder {
        self.verify = !accept;
        self
    }

    pub fn global_rate_limit(mut self, capacity: f64, per_second: f64) -> ClientBuilder {
        self.global_rate = Some((capacity, per_second));
        self
    }

    pub fn per_host_rate_limit(mut self, capacity: f64, per_second: f64) -> ClientBuilder {
        self.per_host_rate = Some((capacity, per_second));
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> ClientBuilder {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> ClientBuilder {
        self.backoff = backoff;
        self
    }

    pub fn http3(mut self, enabled: bool) -> ClientBuilder {
        self.http3 = enabled;
        self
    }

    pub fn http3_fallback(mut self, fallback: bool) -> ClientBuilder {
        self.http3_fallback = fallback;
        self
    }

    pub fn build(self) -> crate::Result<Client> {
        let mut profile = profile::get_profile(&self.profile_name)?;
        profile::apply_overlays(&mut profile, self.ja3.as_ref(), self.extra_fp.as_ref());
        if !self.http3 && self.force_http1 {
            profile::apply_force_http1(&mut profile);
        }

        let proxy = self
            .proxy
            .map(|url| url::Url::parse(&url).map_err(crate::Error::builder))
            .transpose()?
            .map(|url| ProxySpec::parse(&url))
            .transpose()?;

        let global_limiter = self.global_rate.map(|(cap, rate)| TokenBucket::new(cap, rate));

        let inner = ClientInner {
            profile,
            pool: Pool::new(self.max_idle_per_host),
            proxy,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            accepts: Accepts::default(),
            auto_decompress: self.auto_decompress,
            verify: self.verify,
            global_limiter,
            per_host_rate: self.per_host_rate,
            per_host_limiters: Mutex::new(HashMap::new()),
            max_retries: self.max_retries,
            backoff: self.backoff,
            http3_enabled: self.http3,
            http3_fallback: self.http3_fallback,
            h3_failed_hosts: Mutex::new(HashSet::new()),
            #[cfg(feature = "http3")]
            h3_sessions: Mutex::new(HashMap::new()),
        };

        Ok(Client {
            inner: std::sync::Arc::new(inner),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_resolves_named_profile() {
        let client = ClientBuilder::new().impersonate("chrome-120").build().unwrap();
        assert_eq!(client.inner.profile.name, "chrome-120");
    }

    #[test]
    fn connect_timeout_defaults_separately_from_overall_timeout() {
        let client = ClientBuilder::new().impersonate("chrome-120").build().unwrap();
        assert_eq!(client.inner.connect_timeout, Duration::from_secs(10));
        assert_eq!(client.inner.timeout, Duration::from_secs(30));
    }

    #[test]
    fn connect_timeout_is_overridable() {
        let client = ClientBuilder::new()
            .impersonate("chrome-120")
            .connect_timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        assert_eq!(client.inner.connect_timeout, Duration::from_millis(500));
    }

    #[test]
    fn build_rejects_unknown_profile() {
        let err = ClientBuilder::new().impersonate("nonexistent").build().unwrap_err();
        assert!(err.is_unknown_profile());
    }

    #[test]
    fn force_http1_without_h3_narrows_alpn() {
        let client = ClientBuilder::new()
            .impersonate("chrome-120")
            .force_http1(true)
            .build()
            .unwrap();
        assert_eq!(client.inner.profile.tls.alpn, vec!["http/1.1".to_string()]);
    }
}
