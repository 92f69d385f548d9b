//! C3: the deterministic header canonicalizer (spec §4.2).
//!
//! Merges profile defaults with caller-supplied headers under a
//! profile-defined order, silently stripping CR/LF/NUL from names and
//! values to close header-injection classes before anything is inserted
//! into the working map.

use std::collections::HashMap;

/// An ordered `(name, value)` header list, case preserved on the name as
/// last-written, in the order spec §4.2 step 3 requires.
pub type OrderedHeaders = Vec<(String, String)>;

/// Whether `headers` already carries `name`, case-insensitively.
pub fn has(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
}

/// Inserts or overwrites `name` in place, preserving its original insertion
/// position on overwrite and appending on first write (spec §8 property 2:
/// user headers must never be reordered by a later upsert).
pub fn upsert(headers: &mut Vec<(String, String)>, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
        Some(entry) => entry.1 = value,
        None => headers.push((name, value)),
    }
}

/// Appends `name: value` only if `name` is not already present.
pub fn insert_if_absent(headers: &mut Vec<(String, String)>, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    if !has(headers, &name) {
        headers.push((name, value.into()));
    }
}

/// Deletes `\r`, `\n`, and `\0` from a header name or value. This is not an
/// error: the output is used as-is, matching the wire-injection tests in
/// spec §8 property 3.
fn sanitize(s: &str) -> String {
    s.chars().filter(|&c| c != '\r' && c != '\n' && c != '\0').collect()
}

struct Entry {
    original_name: String,
    value: String,
}

/// Canonicalizes `defaults` merged with `user` under `order` (spec §4.2).
///
/// 1. Sanitize every name/value from both sources.
/// 2. Insert defaults keyed by lowercase name; overlay user entries with
///    last-write-wins, keeping the *last* source's original case.
/// 3. Emit entries whose lowercase key is in `order`, in `order`'s
///    sequence, then the rest in original insertion order.
pub fn canonicalize(
    defaults: &[(String, String)],
    user: Option<&[(String, String)]>,
    order: &[String],
) -> OrderedHeaders {
    let mut map: HashMap<String, Entry> = HashMap::new();
    let mut insertion_order: Vec<String> = Vec::new();

    for (name, value) in defaults {
        let name = sanitize(name);
        let value = sanitize(value);
        let key = name.to_ascii_lowercase();
        if !map.contains_key(&key) {
            insertion_order.push(key.clone());
        }
        map.insert(
            key,
            Entry {
                original_name: name,
                value,
            },
        );
    }

    if let Some(user) = user {
        for (name, value) in user {
            let name = sanitize(name);
            let value = sanitize(value);
            let key = name.to_ascii_lowercase();
            if !map.contains_key(&key) {
                insertion_order.push(key.clone());
            }
            map.insert(
                key,
                Entry {
                    original_name: name,
                    value,
                },
            );
        }
    }

    let mut out = Vec::with_capacity(map.len());
    let mut remaining = map;

    for name in order {
        let key = name.to_ascii_lowercase();
        if let Some(entry) = remaining.remove(&key) {
            out.push((entry.original_name, entry.value));
        }
    }

    for key in insertion_order {
        if let Some(entry) = remaining.remove(&key) {
            out.push((entry.original_name, entry.value));
        }
    }

    out
}

/// Inserts `Connection: keep-alive` at index 1 (right after `Host`) when no
/// `Connection` header is present and the request is HTTP/1.1. This is
/// executor-level policy per spec §4.2, not part of the canonicalizer.
pub fn ensure_keep_alive(headers: &mut OrderedHeaders) {
    let has_connection = headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("connection"));
    if has_connection {
        return;
    }
    let index = if headers
        .first()
        .map(|(name, _)| name.eq_ignore_ascii_case("host"))
        .unwrap_or(false)
    {
        1
    } else {
        0
    };
    headers.insert(
        index.min(headers.len()),
        ("Connection".to_owned(), "keep-alive".to_owned()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn order_is_stable_relative_to_profile_order() {
        let defaults = vec![
            ("Host".to_string(), "example.com".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
        ];
        let user = ordered(&[("User-Agent", "test"), ("X-Custom", "1")]);
        let order = vec!["host".to_string(), "accept".to_string()];

        let out = canonicalize(&defaults, Some(&user), &order);
        assert_eq!(out[0].0, "Host");
        assert_eq!(out[1].0, "Accept");
        // Unordered headers follow in insertion order from `user` (via
        // defaults-then-user insertion order).
        let rest: Vec<&str> = out[2..].iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(rest, vec!["User-Agent", "X-Custom"]);
    }

    #[test]
    fn user_overlay_wins_and_keeps_its_case() {
        let defaults = vec![("accept-encoding".to_string(), "gzip".to_string())];
        let user = ordered(&[("Accept-Encoding", "br")]);
        let out = canonicalize(&defaults, Some(&user), &[]);
        assert_eq!(out, vec![("Accept-Encoding".to_string(), "br".to_string())]);
    }

    #[test]
    fn strips_cr_lf_nul_without_creating_new_headers() {
        let defaults = vec![("X-A".to_string(), "safe".to_string())];
        let user = ordered(&[("X-Evil\r\nX-Injected", "v\r\nalue\0")]);
        let out = canonicalize(&defaults, Some(&user), &[]);
        assert_eq!(out.len(), 2);
        for (name, value) in &out {
            assert!(!name.contains(['\r', '\n', '\0']));
            assert!(!value.contains(['\r', '\n', '\0']));
        }
        assert_eq!(out[1].0, "X-EvilX-Injected");
        assert_eq!(out[1].1, "value");
    }

    #[test]
    fn keep_alive_inserted_after_host() {
        let mut headers = vec![
            ("Host".to_string(), "example.com".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
        ];
        ensure_keep_alive(&mut headers);
        assert_eq!(headers[1], ("Connection".to_string(), "keep-alive".to_string()));
    }

    #[test]
    fn keep_alive_skipped_if_connection_present() {
        let mut headers = vec![("Connection".to_string(), "close".to_string())];
        ensure_keep_alive(&mut headers);
        assert_eq!(headers.len(), 1);
    }
}
