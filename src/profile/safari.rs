//! Safari profiles (16.5, 17.5, iOS 17.4.1), grounded on
//! `penumbra-x-rquest/src/tls/impersonate/safari/*.rs`.

use super::{
    CanvasWebgl, HeaderProfile, Http2Profile, PseudoHeader, Profile, SettingId, TlsProfile,
};

const SAFARI_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

const SAFARI_CURVES: &[&str] = &["X25519", "secp256r1", "secp384r1", "secp521r1"];

fn safari_headers(ua: &str) -> HeaderProfile {
    HeaderProfile {
        order: vec![
            "host".to_string(),
            "accept".to_string(),
            "accept-language".to_string(),
            "accept-encoding".to_string(),
            "connection".to_string(),
            "user-agent".to_string(),
        ],
        default: vec![
            ("accept".to_string(), "*/*".to_string()),
            ("accept-language".to_string(), "en-US,en;q=0.9".to_string()),
            ("accept-encoding".to_string(), "gzip, deflate, br".to_string()),
            ("user-agent".to_string(), ua.to_string()),
        ],
    }
}

fn safari(name: &str, ua: &str, mobile: bool) -> Profile {
    Profile {
        name: name.to_string(),
        tls: TlsProfile {
            ciphers: SAFARI_CIPHERS.iter().map(|s| s.to_string()).collect(),
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
            curves: SAFARI_CURVES.iter().map(|s| s.to_string()).collect(),
            sig_algs: vec![
                "ecdsa_secp256r1_sha256".to_string(),
                "rsa_pss_rsae_sha256".to_string(),
                "rsa_pkcs1_sha256".to_string(),
                "ecdsa_secp384r1_sha384".to_string(),
                "rsa_pss_rsae_sha384".to_string(),
                "rsa_pkcs1_sha384".to_string(),
            ],
        },
        http2: Http2Profile {
            settings: vec![
                (SettingId::HeaderTableSize, 4096),
                (SettingId::MaxConcurrentStreams, 100),
                (SettingId::InitialWindowSize, 2097152),
                (SettingId::EnablePush, 0),
            ],
            pseudo_header_order: vec![
                PseudoHeader::Method,
                PseudoHeader::Scheme,
                PseudoHeader::Path,
                PseudoHeader::Authority,
            ],
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
        },
        http3: None,
        headers: safari_headers(ua),
        client_hints: None,
        canvas_webgl: mobile.then(|| CanvasWebgl {
            canvas_hash: None,
            webgl_vendor: Some("Apple Inc.".to_string()),
            webgl_renderer: Some("Apple GPU".to_string()),
        }),
        ja3_str: None,
        akamai_str: None,
        extra_fp: None,
    }
}

pub fn profiles() -> Vec<Profile> {
    vec![
        safari(
            "safari-16.5",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15",
            false,
        ),
        safari(
            "safari-17.5",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
            false,
        ),
        safari(
            "safari-ios-17.4.1",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Mobile/15E148 Safari/604.1",
            true,
        ),
    ]
}
