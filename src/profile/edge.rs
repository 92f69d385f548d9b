//! Edge profile (122), grounded on
//! `penumbra-x-rquest/src/tls/impersonate/edge/*.rs`: a Chromium TLS/H2
//! fingerprint with Edge-specific client hints and `User-Agent`.

use super::{ClientHints, HeaderProfile, Http2Profile, Http3Profile, Profile, TlsProfile};

fn edge_headers(ua: &str) -> HeaderProfile {
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
            "accept-encoding".to_string(),
            "accept-language".to_string(),
        ],
        default: vec![
            (
                "sec-ch-ua".to_string(),
                "\"Microsoft Edge\";v=\"122\", \"Not(A:Brand\";v=\"24\", \"Chromium\";v=\"122\""
                    .to_string(),
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
            ("accept-encoding".to_string(), "gzip, deflate, br".to_string()),
            ("accept-language".to_string(), "en-US,en;q=0.9".to_string()),
        ],
    }
}

pub fn profiles() -> Vec<Profile> {
    let chrome_base = super::chrome::profiles()
        .into_iter()
        .find(|p| p.name == "chrome-120")
        .expect("chrome-120 profile is always present");

    vec![Profile {
        name: "edge-122".to_string(),
        tls: chrome_base.tls,
        http2: Http2Profile {
            alpn: chrome_base.http2.alpn,
            ..chrome_base.http2
        },
        http3: Some(Http3Profile {
            max_stream_data: 6_291_456,
            max_data: 15_728_640,
            idle_timeout_secs: 30,
            max_streams_bidi: 100,
        }),
        headers: edge_headers(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0",
        ),
        client_hints: Some(ClientHints {
            sec_ch_ua: Some(
                "\"Microsoft Edge\";v=\"122\", \"Not(A:Brand\";v=\"24\", \"Chromium\";v=\"122\""
                    .to_string(),
            ),
            sec_ch_ua_platform: Some("\"Windows\"".to_string()),
            sec_ch_ua_mobile: Some("?0".to_string()),
        }),
        canvas_webgl: None,
        ja3_str: None,
        akamai_str: None,
        extra_fp: None,
    }]
}
