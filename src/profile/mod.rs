//! C1/C2: the browser profile catalog and JA3/ExtraFingerprint overlay
//! resolver (spec §3, §4.1).
//!
//! Profiles are modeled as plain structs with optional substructures
//! (`client_hints`, `canvas_webgl`, `http3`) rather than free-form maps, so
//! the invariants in spec §3 are enforced at compile time instead of at
//! lookup time (spec §9 design note).

mod brave;
mod chrome;
mod edge;
mod firefox;
mod okhttp;
mod opera;
mod overlay;
mod safari;
mod tor;

pub use overlay::{ExtraFingerprint, Ja3Overlay};

use std::collections::HashMap;
use std::sync::OnceLock;

/// An ordered, case-insensitive-by-name TLS configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsProfile {
    pub ciphers: Vec<String>,
    pub alpn: Vec<String>,
    pub curves: Vec<String>,
    pub sig_algs: Vec<String>,
}

/// A recognized HTTP/2 SETTINGS identifier, transmitted in profile order
/// (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingId {
    HeaderTableSize,
    EnablePush,
    MaxConcurrentStreams,
    InitialWindowSize,
    MaxHeaderListSize,
}

/// A recognized HTTP/2 pseudo-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoHeader {
    Method,
    Path,
    Authority,
    Scheme,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Http2Profile {
    pub settings: Vec<(SettingId, u32)>,
    pub pseudo_header_order: Vec<PseudoHeader>,
    pub alpn: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Http3Profile {
    pub max_stream_data: u64,
    pub max_data: u64,
    pub idle_timeout_secs: u64,
    pub max_streams_bidi: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderProfile {
    /// Ordered list of header names (case-insensitive), spec §3.
    pub order: Vec<String>,
    /// Ordered `(name, value)` defaults, spec §3.
    pub default: Vec<(String, String)>,
}

/// Client-hint values carried verbatim; specter has no transport semantics
/// for them (spec §1 Non-goals) beyond transmitting whatever the caller's
/// header set encodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHints {
    pub sec_ch_ua: Option<String>,
    pub sec_ch_ua_platform: Option<String>,
    pub sec_ch_ua_mobile: Option<String>,
}

/// Canvas/WebGL telemetry values carried verbatim (spec §1 Non-goals: no
/// DOM-level emulation, only transport of whatever the caller supplies
/// through non-HTTP channels).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanvasWebgl {
    pub canvas_hash: Option<String>,
    pub webgl_vendor: Option<String>,
    pub webgl_renderer: Option<String>,
}

/// A browser profile: immutable after construction, deep-copied on every
/// catalog lookup (spec §3, §8 property 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub tls: TlsProfile,
    pub http2: Http2Profile,
    pub http3: Option<Http3Profile>,
    pub headers: HeaderProfile,
    pub client_hints: Option<ClientHints>,
    pub canvas_webgl: Option<CanvasWebgl>,
    pub ja3_str: Option<String>,
    pub akamai_str: Option<String>,
    pub extra_fp: Option<ExtraFingerprint>,
}

impl Profile {
    /// Validates the invariants spec §3 requires of a shipped profile:
    /// every `headers.order` name present in `headers.default` must match
    /// case-insensitively, ALPN tokens are recognized, and `ENABLE_PUSH`
    /// (if set) is `0`.
    fn validate(&self) {
        for token in self.tls.alpn.iter().chain(self.http2.alpn.iter()) {
            debug_assert!(
                matches!(token.as_str(), "http/1.1" | "h2" | "h3"),
                "unrecognized ALPN token in shipped profile: {token}"
            );
        }
        for (id, value) in &self.http2.settings {
            if matches!(id, SettingId::EnablePush) {
                debug_assert_eq!(*value, 0, "shipped profiles must disable HTTP/2 push");
            }
        }
    }
}

fn catalog() -> &'static HashMap<String, Profile> {
    static CATALOG: OnceLock<HashMap<String, Profile>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let mut map = HashMap::new();
        let mut insert = |p: Profile| {
            p.validate();
            map.insert(p.name.clone(), p);
        };
        for p in chrome::profiles() {
            insert(p);
        }
        for p in firefox::profiles() {
            insert(p);
        }
        for p in safari::profiles() {
            insert(p);
        }
        for p in edge::profiles() {
            insert(p);
        }
        for p in okhttp::profiles() {
            insert(p);
        }
        map
    })
}

fn aliases() -> &'static HashMap<String, String> {
    static ALIASES: OnceLock<HashMap<String, String>> = OnceLock::new();
    ALIASES.get_or_init(|| {
        let mut map = HashMap::new();
        for (alias, base) in brave::aliases().into_iter().chain(opera::aliases()).chain(tor::aliases()) {
            map.insert(alias, base);
        }
        map
    })
}

/// Returns a deep copy of the named profile, resolving aliases, or
/// `UnknownProfile` if neither the catalog nor the alias table has it
/// (spec §4.1).
pub fn get_profile(name: &str) -> crate::Result<Profile> {
    if let Some(profile) = catalog().get(name) {
        return Ok(profile.clone());
    }
    if let Some(base) = aliases().get(name) {
        if let Some(profile) = catalog().get(base) {
            return Ok(profile.clone());
        }
    }
    Err(crate::Error::unknown_profile(name))
}

/// Lists every profile name in the catalog, for callers that want to
/// enumerate what is shipped (SPEC_FULL.md §5).
pub fn profile_names() -> Vec<String> {
    let mut names: Vec<String> = catalog().keys().cloned().collect();
    names.sort();
    names
}

/// Lists every alias name, mapping to its base profile.
pub fn alias_names() -> Vec<(String, String)> {
    let mut names: Vec<(String, String)> = aliases()
        .iter()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect();
    names.sort();
    names
}

/// Applies JA3 / ExtraFingerprint overlays onto a profile copy in place
/// (spec §4.1).
pub fn apply_overlays(
    profile: &mut Profile,
    ja3: Option<&Ja3Overlay>,
    extra_fp: Option<&ExtraFingerprint>,
) {
    if let Some(ja3) = ja3 {
        if let Some(ciphers) = &ja3.ciphers {
            if !ciphers.is_empty() {
                profile.tls.ciphers = ciphers.clone();
            }
        }
        if let Some(alpn) = &ja3.alpn {
            if !alpn.is_empty() {
                profile.tls.alpn = alpn.clone();
                profile.http2.alpn = alpn.clone();
            }
        }
        if let Some(curves) = &ja3.curves {
            if !curves.is_empty() {
                profile.tls.curves = curves.clone();
            }
        }
        if let Some(sig_algs) = &ja3.sig_algs {
            if !sig_algs.is_empty() {
                profile.tls.sig_algs = sig_algs.clone();
            }
        }
        if ja3.ja3_str.is_some() {
            profile.ja3_str = ja3.ja3_str.clone();
        }
        if ja3.akamai_str.is_some() {
            profile.akamai_str = ja3.akamai_str.clone();
        }
    }

    if let Some(extra_fp) = extra_fp {
        if let Some(alpn) = &extra_fp.alpn {
            profile.tls.alpn = alpn.clone();
            profile.http2.alpn = alpn.clone();
        }
        if let Some(ciphers) = &extra_fp.ciphers {
            profile.tls.ciphers = vec![ciphers.join(":")];
        }
        if let Some(curves) = &extra_fp.curves {
            profile.tls.curves = curves.clone();
        }
        if let Some(sig_algs) = &extra_fp.sig_algs {
            profile.tls.sig_algs = sig_algs.clone();
        }
        profile.extra_fp = Some(extra_fp.clone());
    }
}

/// Force-HTTP/1 rule (spec §4.1): when the caller disables H3 and sets
/// `force_http1`, both `tls.alpn` and `http2.alpn` are replaced with
/// `["http/1.1"]` before any connection opens.
pub fn apply_force_http1(profile: &mut Profile) {
    profile.tls.alpn = vec!["http/1.1".to_string()];
    profile.http2.alpn = vec!["http/1.1".to_string()];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_errors() {
        let err = get_profile("netscape-navigator-4").unwrap_err();
        assert!(err.is_unknown_profile());
    }

    #[test]
    fn lookup_is_a_deep_copy() {
        let mut first = get_profile("chrome-120").unwrap();
        first.tls.ciphers.push("MUTATED".to_string());
        let second = get_profile("chrome-120").unwrap();
        assert!(!second.tls.ciphers.iter().any(|c| c == "MUTATED"));
    }

    #[test]
    fn alias_resolves_to_base_profile_shape() {
        let brave = get_profile("brave-124").unwrap();
        let chrome = get_profile("chrome-120").unwrap();
        // Brave mirrors a Chrome TLS/H2 fingerprint; alias resolution must
        // not silently invent a distinct shape.
        assert_eq!(brave.tls.alpn, chrome.tls.alpn);
    }

    #[test]
    fn force_http1_overrides_both_alpn_lists() {
        let mut profile = get_profile("chrome-120").unwrap();
        apply_force_http1(&mut profile);
        assert_eq!(profile.tls.alpn, vec!["http/1.1".to_string()]);
        assert_eq!(profile.http2.alpn, vec!["http/1.1".to_string()]);
    }

    #[test]
    fn ja3_overlay_overwrites_only_nonempty_fields() {
        let mut profile = get_profile("chrome-120").unwrap();
        let original_curves = profile.tls.curves.clone();
        let overlay = Ja3Overlay {
            ciphers: Some(vec!["TLS_AES_128_GCM_SHA256".to_string()]),
            alpn: None,
            curves: Some(vec![]),
            sig_algs: None,
            ja3_str: None,
            akamai_str: None,
        };
        apply_overlays(&mut profile, Some(&overlay), None);
        assert_eq!(
            profile.tls.ciphers,
            vec!["TLS_AES_128_GCM_SHA256".to_string()]
        );
        assert_eq!(profile.tls.curves, original_curves);
    }
}
