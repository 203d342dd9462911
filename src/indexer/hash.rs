// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content fingerprinting for change detection.

/// Hex-encoded 256-bit BLAKE3 digest of a document's content.
///
/// Pure and deterministic: the same content yields the same digest across
/// calls and across process runs, so a matching digest means the stored
/// embedding is still valid.
pub fn content_hash(content: &str) -> String {
    content_hash_bytes(content.as_bytes())
}

/// Digest of raw file bytes. Documents are fingerprinted before any text
/// decoding, so distinct invalid UTF-8 sequences never collide.
pub fn content_hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(content_hash("# Guide\nhello"), content_hash("# Guide\nhello"));
    }

    #[test]
    fn hash_differs_for_different_content() {
        assert_ne!(content_hash("a"), content_hash("b"));
        assert_ne!(content_hash("a"), content_hash("a "));
    }

    #[test]
    fn byte_hash_sees_invalid_utf8() {
        assert_ne!(content_hash_bytes(b"caf\xe9"), content_hash_bytes(b"caf\xe8"));
        assert_eq!(content_hash_bytes(b"caf\xc3\xa9"), content_hash("caf\u{e9}"));
    }

    #[test]
    fn hash_is_256_bit_hex() {
        let digest = content_hash("");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        // Known BLAKE3 digest of the empty input; pins the digest across runs.
        assert_eq!(
            digest,
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }
}
