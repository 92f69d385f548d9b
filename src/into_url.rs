//! Trait for converting a caller-supplied value into a [`Url`], and the
//! C4 URL Parser: scheme validation, default ports, and path normalization.

use std::borrow::Cow;
use url::Url;

/// A trait to try to convert some type into a `Url`.
///
/// This trait is "sealed", such that only types within `specter` can
/// implement it.
pub trait IntoUrl: IntoUrlSealed {}

impl IntoUrl for Url {}
impl IntoUrl for String {}
impl IntoUrl for &Url {}
impl IntoUrl for &str {}
impl IntoUrl for &String {}
impl IntoUrl for Cow<'_, str> {}

pub trait IntoUrlSealed {
    fn into_url(self) -> crate::Result<Url>;
    fn as_str(&self) -> &str;
}

impl IntoUrlSealed for Url {
    fn into_url(self) -> crate::Result<Url> {
        validate_scheme(&self)?;
        Ok(self)
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for &Url {
    fn into_url(self) -> crate::Result<Url> {
        validate_scheme(self)?;
        Ok(self.clone())
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for &str {
    fn into_url(self) -> crate::Result<Url> {
        let url = Url::parse(self).map_err(crate::Error::builder)?;
        url.into_url()
    }

    fn as_str(&self) -> &str {
        self
    }
}

impl IntoUrlSealed for &String {
    fn into_url(self) -> crate::Result<Url> {
        (&**self).into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for String {
    fn into_url(self) -> crate::Result<Url> {
        (&*self).into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

impl IntoUrlSealed for Cow<'_, str> {
    fn into_url(self) -> crate::Result<Url> {
        self.as_ref().into_url()
    }

    fn as_str(&self) -> &str {
        self.as_ref()
    }
}

fn validate_scheme(url: &Url) -> crate::Result<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(crate::Error::unsupported_scheme(other)),
    }
}

/// The resolved pieces of a target URL needed to open a connection and
/// write a request line, per spec §4.3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Path plus `?query`, never empty (defaults to `"/"`). Fragment is
    /// discarded; it is never transmitted on the wire.
    pub path_and_query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn is_https(self) -> bool {
        matches!(self, Scheme::Https)
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Parses and validates a URL per spec §4.3: only `http`/`https`, port
/// defaults to the scheme default, path defaults to `"/"`, query is
/// re-attached with `?`, fragment is dropped.
pub fn parse_url(url: &Url) -> crate::Result<ParsedUrl> {
    let scheme = match url.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => return Err(crate::Error::unsupported_scheme(other)),
    };

    let host = url
        .host_str()
        .ok_or_else(|| crate::Error::builder("url has no host"))?
        .to_owned();

    let port = url.port().unwrap_or_else(|| scheme.default_port());

    let mut path_and_query = if url.path().is_empty() {
        "/".to_owned()
    } else {
        url.path().to_owned()
    };
    if let Some(query) = url.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    Ok(ParsedUrl {
        scheme,
        host,
        port,
        path_and_query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/file").unwrap();
        let err = parse_url(&url).unwrap_err();
        assert!(err.is_unsupported_scheme());
    }

    #[test]
    fn defaults_port_by_scheme() {
        let https = parse_url(&Url::parse("https://example.com/a").unwrap()).unwrap();
        assert_eq!(https.port, 443);
        let http = parse_url(&Url::parse("http://example.com/a").unwrap()).unwrap();
        assert_eq!(http.port, 80);
    }

    #[test]
    fn defaults_path_to_root() {
        let parsed = parse_url(&Url::parse("https://example.com").unwrap()).unwrap();
        assert_eq!(parsed.path_and_query, "/");
    }

    #[test]
    fn reattaches_query_and_drops_fragment() {
        let parsed =
            parse_url(&Url::parse("https://example.com/p?q=1&r=2#frag").unwrap()).unwrap();
        assert_eq!(parsed.path_and_query, "/p?q=1&r=2");
    }

    #[test]
    fn explicit_port_overrides_default() {
        let parsed = parse_url(&Url::parse("https://example.com:8443/p").unwrap()).unwrap();
        assert_eq!(parsed.port, 8443);
    }
}
