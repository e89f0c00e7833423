use sha2::{Digest, Sha256};

use crate::util::hex_encode;

/// One-way hash of a raw secret token, hex-encoded.
///
/// Tokens are looked up by this hash; the raw value only ever exists in the
/// outbound email link.
pub fn hash_token(raw: &str) -> String {
    hex_encode(&Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_hex() {
        let a = hash_token("secret");
        let b = hash_token("secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(hash_token("a"), hash_token("b"));
    }
}
