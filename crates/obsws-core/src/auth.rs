//! Authentication key derivation for the handshake.
//!
//! The server's Hello carries a per-password `salt` and a per-connection
//! `challenge`. The client proves knowledge of the password without
//! transmitting it by sending back a two-round salted hash:
//!
//! ```text
//! secret      = SHA256(password ++ salt)
//! secret_b64  = Base64(secret)
//! auth_key    = Base64(SHA256(secret_b64 ++ challenge))
//! ```
//!
//! Both rounds use the same digest, and the intermediate result is
//! Base64-encoded (not hex) before the second round; the server computes the
//! identical chain and rejects anything else.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Derives the authentication key for an Identify message.
///
/// Deterministic: the same `(password, salt, challenge)` always yields the
/// same key. No secret material is retained after this returns; buffers are
/// sized from the digest's declared output length.
pub fn derive_auth_key(password: &str, salt: &str, challenge: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    let secret_b64 = BASE64.encode(hasher.finalize());

    let mut hasher = Sha256::new();
    hasher.update(secret_b64.as_bytes());
    hasher.update(challenge.as_bytes());
    BASE64.encode(hasher.finalize())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_auth_key_is_deterministic() {
        let a = derive_auth_key("password", "salt1", "challenge1");
        let b = derive_auth_key("password", "salt1", "challenge1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_auth_key_known_vector() {
        // Independently computed: Base64(SHA256(Base64(SHA256(pw+salt)) + challenge))
        let key = derive_auth_key(
            "supersecret",
            "PZVbYpvAnZut2SS6JNJytDm9",
            "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=",
        );
        assert_eq!(key, "/kXewdhJg9Va324lti5trDChqI6hqciQWmo1iQFt7GY=");
    }

    #[test]
    fn test_derive_auth_key_known_vector_fixed_strings() {
        let key = derive_auth_key("password", "salt1", "challenge1");
        assert_eq!(key, "M1Fe/Ud5K+Maw1MxCMYND6OmiCoRDFeLHoQD5oekGUE=");
    }

    #[test]
    fn test_derive_auth_key_is_salt_sensitive() {
        let a = derive_auth_key("password", "salt1", "challenge1");
        let b = derive_auth_key("password", "salt2", "challenge1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_auth_key_is_challenge_sensitive() {
        let a = derive_auth_key("password", "salt1", "challenge1");
        let b = derive_auth_key("password", "salt1", "challenge2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_auth_key_empty_inputs() {
        // Even empty strings hash to a well-formed key (44-char padded Base64
        // of a 32-byte digest).
        let key = derive_auth_key("", "", "");
        assert_eq!(key, "XEB0z23rR/W2r5xf4+C70OQrlZb+iKxU1ca275h+DyA=");
        assert_eq!(key.len(), 44);
    }

    #[test]
    fn test_key_is_base64_not_hex() {
        let key = derive_auth_key("password", "salt1", "challenge1");
        // A hex digest would be 64 chars of [0-9a-f]; the key must be the
        // 44-char padded Base64 form instead.
        assert_eq!(key.len(), 44);
        assert!(key.ends_with('='));
    }
}
