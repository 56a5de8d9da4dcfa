//! Cache key derivation.

use sha2::{Digest, Sha256};

use super::entry::RequestKind;

/// Derives the cache key for a request.
///
/// Hex-encoded SHA-256 over kind, topic and language, each field prefixed
/// with its byte length (`u64`, little-endian) so no two triples share an
/// encoding. Stable across process restarts.
pub fn derive_key(kind: RequestKind, topic: &str, language: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [kind.as_str(), topic, language] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = derive_key(RequestKind::News, "AI", "en");
        let b = derive_key(RequestKind::News, "AI", "en");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_matches_sha256_of_length_prefixed_fields() {
        let mut encoded = Vec::new();
        for field in ["summary", "rust", "en"] {
            encoded.extend_from_slice(&(field.len() as u64).to_le_bytes());
            encoded.extend_from_slice(field.as_bytes());
        }
        let expected = format!("{:x}", Sha256::digest(&encoded));
        assert_eq!(derive_key(RequestKind::Summary, "rust", "en"), expected);
    }

    #[test]
    fn test_distinct_requests_get_distinct_keys() {
        let keys = [
            derive_key(RequestKind::News, "AI", "en"),
            derive_key(RequestKind::News, "AI", "de"),
            derive_key(RequestKind::News, "ai", "en"),
            derive_key(RequestKind::Summary, "AI", "en"),
            derive_key(RequestKind::Trending, "AI", "en"),
            // Separator characters inside free-text fields
            derive_key(RequestKind::News, "a:b", "c"),
            derive_key(RequestKind::News, "a", "b:c"),
            derive_key(RequestKind::News, "Star Wars: Andor", "en"),
            derive_key(RequestKind::News, "Star Wars", " Andor:en"),
            derive_key(RequestKind::News, "", "en"),
            derive_key(RequestKind::News, "en", ""),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
