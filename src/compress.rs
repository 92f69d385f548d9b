//! C5: the compression codec (spec §4.5) — `Accept-Encoding` derivation and
//! best-effort decoding of `gzip` / `deflate` (raw + zlib-wrapped) / `br`.
//!
//! Grounded on `penumbra-x-rquest/src/client/decoder.rs`'s `Accepts` struct
//! and feature-gated codec selection; decoding itself uses
//! `async-compression`'s buffered (non-streaming) adapters, matching the
//! teacher's `tokio-util` + `async-compression` compression stack.

use futures_util::io::AsyncReadExt;

/// Which content-codings this client will negotiate, mirroring the
/// teacher's `Accepts` (spec §4.5).
#[derive(Clone, Debug)]
pub struct Accepts {
    #[cfg(feature = "gzip")]
    pub gzip: bool,
    #[cfg(feature = "deflate")]
    pub deflate: bool,
    #[cfg(feature = "brotli")]
    pub brotli: bool,
}

impl Default for Accepts {
    fn default() -> Accepts {
        Accepts {
            #[cfg(feature = "gzip")]
            gzip: true,
            #[cfg(feature = "deflate")]
            deflate: true,
            #[cfg(feature = "brotli")]
            brotli: brotli_available(),
        }
    }
}

impl Accepts {
    /// Derives the `Accept-Encoding` value to send, per spec §4.5: identity
    /// when auto-decompress is off, the profile's own header verbatim when
    /// present, else `"gzip, deflate, br"` with `br` dropped when this
    /// build has no brotli support.
    pub fn header_value(&self, auto_decompress: bool, profile_value: Option<&str>) -> String {
        if !auto_decompress {
            return "identity".to_string();
        }
        if let Some(value) = profile_value {
            return value.to_string();
        }
        let mut tokens = Vec::new();
        #[cfg(feature = "gzip")]
        if self.gzip {
            tokens.push("gzip");
        }
        #[cfg(feature = "deflate")]
        if self.deflate {
            tokens.push("deflate");
        }
        #[cfg(feature = "brotli")]
        if self.brotli {
            tokens.push("br");
        }
        if tokens.is_empty() {
            "identity".to_string()
        } else {
            tokens.join(", ")
        }
    }
}

/// Decodes a response body per the `Content-Encoding` header: a
/// comma-separated list, decoded in reverse order (spec §4.5). Any failure
/// for any single coding returns the bytes unchanged rather than
/// propagating, since mislabeled test bodies are expected to arrive this
/// way.
pub async fn decode_body(mut body: Vec<u8>, content_encoding: &str) -> Vec<u8> {
    let codings: Vec<&str> = content_encoding
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    for coding in codings.into_iter().rev() {
        body = match decode_one(&body, coding).await {
            Some(decoded) => decoded,
            None => return body,
        };
    }
    body
}

async fn decode_one(body: &[u8], coding: &str) -> Option<Vec<u8>> {
    match coding.to_ascii_lowercase().as_str() {
        #[cfg(feature = "gzip")]
        "gzip" | "x-gzip" => decode_gzip(body).await,
        #[cfg(feature = "deflate")]
        "deflate" => decode_deflate(body).await,
        #[cfg(feature = "brotli")]
        "br" => decode_brotli(body).await,
        _ => None,
    }
}

#[cfg(feature = "gzip")]
async fn decode_gzip(body: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = async_compression::futures::bufread::GzipDecoder::new(body);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).await.ok()?;
    Some(out)
}

#[cfg(feature = "deflate")]
async fn decode_deflate(body: &[u8]) -> Option<Vec<u8>> {
    // Try raw DEFLATE (wbits=-15 equivalent) first, then fall back to
    // zlib-wrapped, per spec §4.5.
    let mut raw = async_compression::futures::bufread::DeflateDecoder::new(body);
    let mut out = Vec::new();
    if raw.read_to_end(&mut out).await.is_ok() && !out.is_empty() {
        return Some(out);
    }
    let mut zlib = async_compression::futures::bufread::ZlibDecoder::new(body);
    let mut out = Vec::new();
    zlib.read_to_end(&mut out).await.ok()?;
    Some(out)
}

#[cfg(feature = "brotli")]
async fn decode_brotli(body: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = async_compression::futures::bufread::BrotliDecoder::new(body);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).await.ok()?;
    Some(out)
}

/// Whether this build was compiled with brotli support, used by the
/// `Accept-Encoding` default (spec §4.5, §9 "Brotli-available ... derived
/// once at load time").
pub const fn brotli_available() -> bool {
    cfg!(feature = "brotli")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identity_when_auto_decompress_off() {
        let accepts = Accepts::default();
        assert_eq!(accepts.header_value(false, None), "identity");
    }

    #[tokio::test]
    async fn profile_value_used_verbatim_when_present() {
        let accepts = Accepts::default();
        assert_eq!(
            accepts.header_value(true, Some("gzip")),
            "gzip"
        );
    }

    #[cfg(feature = "gzip")]
    #[tokio::test]
    async fn gzip_round_trips() {
        use async_compression::futures::bufread::GzipEncoder;
        let original = b"hello, compressed world".to_vec();
        let mut encoder = GzipEncoder::new(original.as_slice());
        let mut encoded = Vec::new();
        encoder.read_to_end(&mut encoded).await.unwrap();

        let decoded = decode_body(encoded, "gzip").await;
        assert_eq!(decoded, original);
    }

    #[tokio::test]
    async fn unsupported_encoding_returns_input_unchanged() {
        let body = b"unchanged".to_vec();
        let decoded = decode_body(body.clone(), "zstd-experimental").await;
        assert_eq!(decoded, body);
    }

    #[cfg(feature = "gzip")]
    #[tokio::test]
    async fn mislabeled_body_returns_unchanged_rather_than_erroring() {
        let body = b"not actually gzipped".to_vec();
        let decoded = decode_body(body.clone(), "gzip").await;
        assert_eq!(decoded, body);
    }
}
