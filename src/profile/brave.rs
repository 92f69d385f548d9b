//! Brave is Chromium under the hood: its TLS/H2 fingerprint is
//! indistinguishable from the Chrome base it ships, so it is modeled as an
//! alias rather than a distinct profile (spec §3 "Aliases").

pub fn aliases() -> Vec<(String, String)> {
    vec![("brave-124".to_string(), "chrome-120".to_string())]
}
