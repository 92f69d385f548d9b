//! The simplified, per-session cookie jar (spec §3 "Cookie Jar", §4.14,
//! §9: "retains only `name=value`... do not extend this in a rewrite").
//!
//! Grounded on `penumbra-x-rquest/src/cookie.rs`'s `Jar` wrapping a
//! lock-guarded store, reduced to the name=value-only semantics the spec
//! requires; still parses with the `cookie` crate so malformed
//! `Set-Cookie` lines are rejected the same way a full jar would.

use std::collections::HashMap;
use std::sync::Mutex;

/// Host → cookie-name → cookie-value (spec §3).
#[derive(Default)]
pub struct Jar {
    by_host: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl Jar {
    pub fn new() -> Jar {
        Jar::default()
    }

    /// Upserts every parseable `Set-Cookie` header value under `host`,
    /// discarding all attributes (spec §6).
    pub fn store(&self, host: &str, set_cookie_values: impl Iterator<Item = impl AsRef<str>>) {
        let mut by_host = self.by_host.lock().expect("cookie jar mutex poisoned");
        let entry = by_host.entry(host.to_string()).or_default();
        for raw in set_cookie_values {
            if let Ok(parsed) = cookie::Cookie::parse(raw.as_ref().to_string()) {
                entry.insert(parsed.name().to_string(), parsed.value().to_string());
            }
        }
    }

    /// Renders the `Cookie:` header value for `host`, or `None` if the
    /// jar has nothing for it (spec §4.14).
    pub fn header_for(&self, host: &str) -> Option<String> {
        let by_host = self.by_host.lock().expect("cookie jar mutex poisoned");
        let cookies = by_host.get(host)?;
        if cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<(&String, &String)> = cookies.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        Some(
            pairs
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_only_name_and_value() {
        let jar = Jar::new();
        jar.store(
            "example.com",
            ["session=abc123; Path=/; HttpOnly; Secure".to_string()].into_iter(),
        );
        assert_eq!(jar.header_for("example.com"), Some("session=abc123".to_string()));
    }

    #[test]
    fn different_hosts_do_not_share_cookies() {
        let jar = Jar::new();
        jar.store("a.example", ["k=v".to_string()].into_iter());
        assert_eq!(jar.header_for("b.example"), None);
    }

    #[test]
    fn later_set_cookie_overwrites_same_name() {
        let jar = Jar::new();
        jar.store("a.example", ["k=v1".to_string()].into_iter());
        jar.store("a.example", ["k=v2".to_string()].into_iter());
        assert_eq!(jar.header_for("a.example"), Some("k=v2".to_string()));
    }

    #[test]
    fn malformed_set_cookie_is_ignored() {
        let jar = Jar::new();
        jar.store("a.example", ["not a cookie at all \r\n".to_string()].into_iter());
        assert_eq!(jar.header_for("a.example"), None);
    }
}
