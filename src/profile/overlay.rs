//! C2: overlay value types applied onto a profile copy (spec §3, §4.1).

/// A JA3-shaped overlay: recognized keys `ciphers`, `alpn`, `curves`,
/// `sig_algs`, each optional and overwriting the profile field only when
/// non-empty, plus the verbatim `ja3_str`/`akamai_str` passthrough fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ja3Overlay {
    pub ciphers: Option<Vec<String>>,
    pub alpn: Option<Vec<String>>,
    pub curves: Option<Vec<String>>,
    pub sig_algs: Option<Vec<String>>,
    pub ja3_str: Option<String>,
    pub akamai_str: Option<String>,
}

/// An `ExtraFingerprint` overlay (spec §4.1): ciphers are folded into a
/// single colon-joined string when written back into the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFingerprint {
    pub alpn: Option<Vec<String>>,
    pub ciphers: Option<Vec<String>>,
    pub curves: Option<Vec<String>>,
    pub sig_algs: Option<Vec<String>>,
}
