//! Firefox profiles (117, 136), grounded on the teacher's Firefox
//! impersonation tables (`tls/impersonate` + `client/emulation`).

use super::{HeaderProfile, Http2Profile, Http3Profile, PseudoHeader, Profile, SettingId, TlsProfile};

const FIREFOX_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_CHACHA20_POLY1305_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-AES256-SHA",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

const FIREFOX_CURVES: &[&str] = &["X25519", "secp256r1", "secp384r1", "secp521r1"];

const FIREFOX_SIG_ALGS: &[&str] = &[
    "ecdsa_secp256r1_sha256",
    "ecdsa_secp384r1_sha384",
    "ecdsa_secp521r1_sha512",
    "rsa_pss_rsae_sha256",
    "rsa_pss_rsae_sha384",
    "rsa_pss_rsae_sha512",
    "rsa_pkcs1_sha256",
    "rsa_pkcs1_sha384",
    "rsa_pkcs1_sha512",
];

fn firefox_headers(ua: &str) -> HeaderProfile {
    HeaderProfile {
        order: vec![
            "host".to_string(),
            "user-agent".to_string(),
            "accept".to_string(),
            "accept-language".to_string(),
            "accept-encoding".to_string(),
            "connection".to_string(),
            "upgrade-insecure-requests".to_string(),
            "sec-fetch-dest".to_string(),
            "sec-fetch-mode".to_string(),
            "sec-fetch-site".to_string(),
            "sec-fetch-user".to_string(),
        ],
        default: vec![
            ("user-agent".to_string(), ua.to_string()),
            (
                "accept".to_string(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                    .to_string(),
            ),
            ("accept-language".to_string(), "en-US,en;q=0.5".to_string()),
            ("accept-encoding".to_string(), "gzip, deflate, br".to_string()),
            ("upgrade-insecure-requests".to_string(), "1".to_string()),
            ("sec-fetch-dest".to_string(), "document".to_string()),
            ("sec-fetch-mode".to_string(), "navigate".to_string()),
            ("sec-fetch-site".to_string(), "none".to_string()),
            ("sec-fetch-user".to_string(), "?1".to_string()),
        ],
    }
}

fn firefox(name: &str, ua: &str) -> Profile {
    Profile {
        name: name.to_string(),
        tls: TlsProfile {
            ciphers: FIREFOX_CIPHERS.iter().map(|s| s.to_string()).collect(),
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
            curves: FIREFOX_CURVES.iter().map(|s| s.to_string()).collect(),
            sig_algs: FIREFOX_SIG_ALGS.iter().map(|s| s.to_string()).collect(),
        },
        http2: Http2Profile {
            settings: vec![
                (super::SettingId::HeaderTableSize, 65536),
                (SettingId::EnablePush, 0),
                (SettingId::InitialWindowSize, 131072),
                (SettingId::MaxHeaderListSize, 393216),
                (SettingId::MaxConcurrentStreams, 100),
            ],
            pseudo_header_order: vec![
                PseudoHeader::Method,
                PseudoHeader::Path,
                PseudoHeader::Authority,
                PseudoHeader::Scheme,
            ],
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
        },
        http3: Some(Http3Profile {
            max_stream_data: 1_048_576,
            max_data: 1_310_720,
            idle_timeout_secs: 60,
            max_streams_bidi: 128,
        }),
        headers: firefox_headers(ua),
        client_hints: None,
        canvas_webgl: None,
        ja3_str: None,
        akamai_str: None,
        extra_fp: None,
    }
}

pub fn profiles() -> Vec<Profile> {
    vec![
        firefox(
            "firefox-117",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:117.0) Gecko/20100101 Firefox/117.0",
        ),
        firefox(
            "firefox-136",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:136.0) Gecko/20100101 Firefox/136.0",
        ),
    ]
}
