//! C15: the session (spec §4.14).
//!
//! A thin wrapper over [`Client`] that adds per-session state the client
//! itself does not carry: a cookie jar and an auto-`Referer` tracker. Both
//! start empty on construction and are never shared across sessions.
//! Grounded on `penumbra-x-rquest/src/async_impl/client.rs`'s separation
//! between the connector-owning `Client` and request-time cookie/referer
//! bookkeeping, here split into its own type instead of folded into
//! `ClientInner` so a caller can run several independent sessions over one
//! pooled `Client`.

use std::sync::Mutex;

use crate::client::Client;
use crate::cookie::Jar;
use crate::header;
use crate::into_url::IntoUrl;
use crate::request::RequestBuilder;
use crate::response::Response;

/// A cookie jar and auto-`Referer` tracker layered over a [`Client`]
/// (spec §4.14). Cheap to create; a new session starts with no cookies and
/// no referer.
pub struct Session {
    client: Client,
    jar: Jar,
    auto_referer: bool,
    previous_url: Mutex<Option<String>>,
}

impl Session {
    pub fn new(client: Client) -> Session {
        Session {
            client,
            jar: Jar::new(),
            auto_referer: true,
            previous_url: Mutex::new(None),
        }
    }

    /// Disables automatic `Referer` population (spec §4.14: on by default).
    pub fn auto_referer(mut self, enabled: bool) -> Session {
        self.auto_referer = enabled;
        self
    }

    /// Starts a `GET` request. Building it is identical to [`Client::get`];
    /// run it through [`Session::execute`], not `RequestBuilder::send`,
    /// so the session's cookie jar and referer tracker apply.
    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.post(url)
    }

    pub fn put(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.put(url)
    }

    pub fn delete(&self, url: impl IntoUrl) -> RequestBuilder {
        self.client.delete(url)
    }

    pub fn request(&self, method: &str, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Builds and runs `builder` through this session: injects
    /// `Cookie`/`Referer` beforehand, executes it, then updates the jar and
    /// referer state from the response (spec §4.14).
    pub async fn execute(&self, builder: RequestBuilder) -> crate::Result<Response> {
        let (_, request) = builder.into_parts();
        self.send(request?).await
    }

    /// Runs an already-built `request`, injecting `Cookie`/`Referer`
    /// beforehand and updating jar/referer state afterward (spec §4.14).
    pub async fn send(&self, mut request: crate::request::Request) -> crate::Result<Response> {
        let host = request.url.host_str().unwrap_or("").to_string();
        let url = request.url.to_string();

        if !header::has(&request.headers, "cookie") {
            if let Some(cookie_header) = self.jar.header_for(&host) {
                header::upsert(&mut request.headers, "Cookie", cookie_header);
            }
        }
        if self.auto_referer && !header::has(&request.headers, "referer") {
            if let Some(previous) = self.previous_url.lock().expect("referer mutex poisoned").clone() {
                header::upsert(&mut request.headers, "Referer", previous);
            }
        }

        let response = self.client.execute(request).await?;

        self.jar.store(&host, response.set_cookie_headers());
        *self.previous_url.lock().expect("referer mutex poisoned") = Some(url);

        Ok(response)
    }

    pub fn close(&self) {
        self.client.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientBuilder;

    fn session() -> Session {
        Session::new(ClientBuilder::new().impersonate("chrome-120").build().unwrap())
    }

    #[test]
    fn new_session_starts_with_no_referer() {
        let session = session();
        assert!(session.previous_url.lock().unwrap().is_none());
    }

    #[test]
    fn auto_referer_can_be_disabled() {
        let session = session().auto_referer(false);
        assert!(!session.auto_referer);
    }
}
