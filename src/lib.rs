//! specter: an HTTP client that faithfully impersonates browser TLS,
//! HTTP/2, and HTTP/3 fingerprints (spec §1).
//!
//! Grounded on `penumbra-x-rquest`'s crate root: a thin `lib.rs` that
//! declares the module tree and re-exports the small set of types a
//! caller actually needs (`Client`, `RequestBuilder`, `Response`, ...),
//! leaving wire-level and pool internals crate-private.
//!
//! ```no_run
//! # async fn run() -> specter::Result<()> {
//! let client = specter::Client::builder().impersonate("chrome-120").build()?;
//! let response = client.get("https://example.com").send().await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod compress;
mod conn;
mod cookie;
mod error;
mod executor;
mod header;
mod into_url;
mod multipart;
mod pool;
mod profile;
mod proxy;
mod ratelimit;
mod request;
mod response;
mod retry;
mod session;
mod stream;
mod tls;
mod transport;

pub use body::BodyInput;
pub use client::{Client, ClientBuilder};
pub use cookie::Jar as CookieJar;
pub use error::{BoxError, Error, Result};
pub use into_url::IntoUrl;
pub use multipart::{Field, FilePart, Form};
pub use profile::{alias_names, profile_names, ExtraFingerprint, Ja3Overlay};
pub use proxy::ProxySpec;
pub use ratelimit::{SlidingWindow, TokenBucket};
pub use request::{Request, RequestBuilder};
pub use response::{Response, Version};
pub use retry::Backoff;
pub use session::Session;
pub use stream::StreamingResponse;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_clone<T: Clone>() {}

    #[test]
    fn client_is_send_sync_and_cheaply_cloneable() {
        assert_send_sync::<Client>();
        assert_clone::<Client>();
    }

    #[test]
    fn session_is_send_sync() {
        assert_send_sync::<Session>();
    }

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<Error>();
    }
}
