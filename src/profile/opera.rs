//! Opera is Chromium-based, like Brave; aliased onto the matching Chrome
//! base profile.

pub fn aliases() -> Vec<(String, String)> {
    vec![("opera-106".to_string(), "chrome-120".to_string())]
}
