//! Content hashing and token fingerprints.

use sha2::{Digest, Sha256};

use crate::defaults::TOKEN_FINGERPRINT_LEN;

/// SHA-256 of a text body as lowercase hex.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Stable user reference derived from an opaque bearer token.
///
/// The token itself is never stored.
pub fn token_fingerprint(token: &str) -> String {
    let mut hash = content_hash(token.trim());
    hash.truncate(TOKEN_FINGERPRINT_LEN);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_hash_empty() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_token_fingerprint_length_and_stability() {
        let a = token_fingerprint("secret-token");
        let b = token_fingerprint("secret-token");
        assert_eq!(a.len(), TOKEN_FINGERPRINT_LEN);
        assert_eq!(a, b);
        assert_ne!(a, token_fingerprint("other-token"));
    }

    #[test]
    fn test_token_fingerprint_ignores_surrounding_whitespace() {
        assert_eq!(token_fingerprint(" t "), token_fingerprint("t"));
    }
}
