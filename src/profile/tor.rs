//! Tor Browser is a hardened Firefox ESR build; its TLS/H2 fingerprint
//! tracks the corresponding Firefox base profile closely enough to alias.

pub fn aliases() -> Vec<(String, String)> {
    vec![("tor-browser-13".to_string(), "firefox-117".to_string())]
}
