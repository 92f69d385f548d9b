//! Chrome profiles (100, 104, 120, 131), grounded on
//! `penumbra-x-rquest/src/client/emulation/chrome.rs` and
//! `penumbra-x-rquest/src/tls/impersonate/chrome/*.rs` header/cipher lists.

use super::{
    ClientHints, HeaderProfile, Http2Profile, Http3Profile, PseudoHeader, Profile, SettingId,
    TlsProfile,
};

const CHROME_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

const CHROME_CURVES: &[&str] = &["X25519", "secp256r1", "secp384r1"];

const CHROME_SIG_ALGS: &[&str] = &[
    "ecdsa_secp256r1_sha256",
    "rsa_pss_rsae_sha256",
    "rsa_pkcs1_sha256",
    "ecdsa_secp384r1_sha384",
    "rsa_pss_rsae_sha384",
    "rsa_pkcs1_sha384",
    "rsa_pss_rsae_sha512",
    "rsa_pkcs1_sha512",
];

fn chrome_tls() -> TlsProfile {
    TlsProfile {
        ciphers: CHROME_CIPHERS.iter().map(|s| s.to_string()).collect(),
        alpn: vec!["h2".to_string(), "http/1.1".to_string()],
        curves: CHROME_CURVES.iter().map(|s| s.to_string()).collect(),
        sig_algs: CHROME_SIG_ALGS.iter().map(|s| s.to_string()).collect(),
    }
}

fn chrome_http2() -> Http2Profile {
    Http2Profile {
        settings: vec![
            (SettingId::HeaderTableSize, 65536),
            (SettingId::EnablePush, 0),
            (SettingId::MaxConcurrentStreams, 1000),
            (SettingId::InitialWindowSize, 6291456),
            (SettingId::MaxHeaderListSize, 262144),
        ],
        pseudo_header_order: vec![
            PseudoHeader::Method,
            PseudoHeader::Authority,
            PseudoHeader::Scheme,
            PseudoHeader::Path,
        ],
        alpn: vec!["h2".to_string(), "http/1.1".to_string()],
    }
}

fn chrome_headers(ua: &str) -> HeaderProfile {
    HeaderProfile {
        order: vec![
            "host".to_string(),
            "connection".to_string(),
            "sec-ch-ua".to_string(),
            "sec-ch-ua-mobile".to_string(),
            "sec-ch-ua-platform".to_string(),
            "upgrade-insecure-requests".to_string(),
            "user-agent".to_string(),
            "accept".to_string(),
            "sec-fetch-site".to_string(),
            "sec-fetch-mode".to_string(),
            "sec-fetch-user".to_string(),
            "sec-fetch-dest".to_string(),
            "accept-encoding".to_string(),
            "accept-language".to_string(),
        ],
        default: vec![
            (
                "sec-ch-ua".to_string(),
                "\"Chromium\";v=\"120\", \"Not=A?Brand\";v=\"99\"".to_string(),
            ),
            ("sec-ch-ua-mobile".to_string(), "?0".to_string()),
            ("sec-ch-ua-platform".to_string(), "\"Windows\"".to_string()),
            ("upgrade-insecure-requests".to_string(), "1".to_string()),
            ("user-agent".to_string(), ua.to_string()),
            (
                "accept".to_string(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9"
                    .to_string(),
            ),
            ("sec-fetch-site".to_string(), "none".to_string()),
            ("sec-fetch-mode".to_string(), "navigate".to_string()),
            ("sec-fetch-user".to_string(), "?1".to_string()),
            ("sec-fetch-dest".to_string(), "document".to_string()),
            ("accept-encoding".to_string(), "gzip, deflate, br".to_string()),
            ("accept-language".to_string(), "en-US,en;q=0.9".to_string()),
        ],
    }
}

fn chrome(name: &str, ua: &str, enable_h3: bool) -> Profile {
    Profile {
        name: name.to_string(),
        tls: chrome_tls(),
        http2: chrome_http2(),
        http3: enable_h3.then(|| Http3Profile {
            max_stream_data: 6_291_456,
            max_data: 15_728_640,
            idle_timeout_secs: 30,
            max_streams_bidi: 100,
        }),
        headers: chrome_headers(ua),
        client_hints: Some(ClientHints {
            sec_ch_ua: Some("\"Chromium\";v=\"120\", \"Not=A?Brand\";v=\"99\"".to_string()),
            sec_ch_ua_platform: Some("\"Windows\"".to_string()),
            sec_ch_ua_mobile: Some("?0".to_string()),
        }),
        canvas_webgl: None,
        ja3_str: None,
        akamai_str: None,
        extra_fp: None,
    }
}

pub fn profiles() -> Vec<Profile> {
    vec![
        chrome(
            "chrome-100",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36",
            false,
        ),
        chrome(
            "chrome-104",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/104.0.5112.81 Safari/537.36",
            false,
        ),
        chrome(
            "chrome-120",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            true,
        ),
        chrome(
            "chrome-131",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
            true,
        ),
    ]
}
