//! OkHttp (Android) profile, grounded on
//! `penumbra-x-rquest/src/impersonate/okhttp/*.rs`.

use super::{HeaderProfile, Http2Profile, Profile, PseudoHeader, SettingId, TlsProfile};

pub fn profiles() -> Vec<Profile> {
    vec![Profile {
        name: "okhttp-4.9".to_string(),
        tls: TlsProfile {
            ciphers: vec![
                "TLS_AES_128_GCM_SHA256".to_string(),
                "TLS_CHACHA20_POLY1305_SHA256".to_string(),
                "ECDHE-ECDSA-AES128-GCM-SHA256".to_string(),
                "ECDHE-RSA-AES128-GCM-SHA256".to_string(),
                "ECDHE-ECDSA-CHACHA20-POLY1305".to_string(),
                "ECDHE-RSA-CHACHA20-POLY1305".to_string(),
            ],
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
            curves: vec!["X25519".to_string(), "secp256r1".to_string()],
            sig_algs: vec![
                "ecdsa_secp256r1_sha256".to_string(),
                "rsa_pss_rsae_sha256".to_string(),
                "rsa_pkcs1_sha256".to_string(),
            ],
        },
        http2: Http2Profile {
            settings: vec![
                (SettingId::InitialWindowSize, 65535),
                (SettingId::MaxConcurrentStreams, 1000),
            ],
            pseudo_header_order: vec![
                PseudoHeader::Method,
                PseudoHeader::Path,
                PseudoHeader::Authority,
                PseudoHeader::Scheme,
            ],
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
        },
        http3: None,
        headers: HeaderProfile {
            order: vec!["host".to_string(), "user-agent".to_string(), "accept-encoding".to_string()],
            default: vec![
                ("user-agent".to_string(), "okhttp/4.9.3".to_string()),
                ("accept-encoding".to_string(), "gzip".to_string()),
            ],
        },
        client_hints: None,
        canvas_webgl: None,
        ja3_str: None,
        akamai_str: None,
        extra_fp: None,
    }]
}
