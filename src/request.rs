//! The public request plan and its builder (spec §3 "Request Plan").
//!
//! Grounded on `penumbra-x-rquest/src/client/request.rs`'s
//! `Request`/`RequestBuilder` split: a plain value plus a builder that
//! defers errors until `send()`, so chained calls never need `?` at each
//! step.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::body::BodyInput;
use crate::client::Client;
use crate::header;
use crate::into_url::IntoUrl;
use crate::multipart::Form;
use crate::response::Response;

/// One fully-specified request, ready for [`crate::executor`] (spec §3).
#[derive(Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) url: Url,
    /// Insertion-ordered so the canonicalizer can preserve caller order
    /// (spec §8 property 2) rather than a hash-seeded iteration order.
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: BodyInput,
    pub(crate) timeout: Option<Duration>,
    pub(crate) proxy_override: Option<Url>,
}

impl Request {
    pub fn new(method: &str, url: Url) -> Request {
        Request {
            method: method.to_ascii_uppercase(),
            url,
            headers: Vec::new(),
            body: BodyInput::None,
            timeout: None,
            proxy_override: None,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// A builder that defers errors to `send()`, matching the teacher's
/// `RequestBuilder` (spec §3, §6).
#[must_use = "RequestBuilder does nothing until you call .send()"]
pub struct RequestBuilder {
    client: Client,
    request: crate::Result<Request>,
}

impl RequestBuilder {
    pub(crate) fn new(client: Client, method: &str, url: impl IntoUrl) -> RequestBuilder {
        let request = url.into_url().map(|url| Request::new(method, url));
        RequestBuilder { client, request }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            header::upsert(&mut req.headers, name, value);
        }
        self
    }

    /// Appends `headers` in the given order, last-write-wins on a repeated
    /// name (spec §8 property 2).
    pub fn headers(mut self, headers: Vec<(String, String)>) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            for (name, value) in headers {
                header::upsert(&mut req.headers, name, value);
            }
        }
        self
    }

    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            req.body = BodyInput::Bytes(bytes.into());
        }
        self
    }

    pub fn text_body(mut self, text: impl Into<String>) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            req.body = BodyInput::Text(text.into());
        }
        self
    }

    pub fn form(mut self, fields: HashMap<String, String>) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            req.body = BodyInput::Form(fields);
        }
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            req.body = BodyInput::Json(value);
        }
        self
    }

    pub fn multipart(mut self, form: Form) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            req.body = BodyInput::Multipart(form);
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> RequestBuilder {
        if let Ok(req) = &mut self.request {
            req.timeout = Some(timeout);
        }
        self
    }

    /// Overrides the client's configured proxy for this one call.
    pub fn proxy(mut self, proxy_url: impl IntoUrl) -> RequestBuilder {
        match (&mut self.request, proxy_url.into_url()) {
            (Ok(req), Ok(url)) => req.proxy_override = Some(url),
            (Ok(_), Err(e)) => self.request = Err(e),
            _ => {}
        }
        self
    }

    pub async fn send(self) -> crate::Result<Response> {
        let request = self.request?;
        self.client.execute(request).await
    }

    /// Runs the request and opens a [`crate::StreamingResponse`] instead
    /// of buffering the whole body (spec §4.10).
    pub async fn send_streaming(self) -> crate::Result<crate::StreamingResponse> {
        let request = self.request?;
        self.client.execute_streaming(request).await
    }

    /// Splits the builder into its client handle and built request, for
    /// [`crate::session::Session::execute`] to run the request through
    /// session-level cookie/referer handling instead of the client
    /// directly.
    pub(crate) fn into_parts(self) -> (Client, crate::Result<Request>) {
        (self.client, self.request)
    }
}
