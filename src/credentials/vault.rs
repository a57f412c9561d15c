/// Authenticated symmetric encryption for credential payloads.
///
/// Secrets are serialized to JSON and sealed with XChaCha20-Poly1305. The
/// persisted token is ASCII:
///
/// ```text
/// <hex nonce (24 bytes)>:<hex auth tag (16 bytes)>:<hex ciphertext>
/// ```
///
/// Every call to [`CredentialVault::encrypt`] draws a fresh random nonce, so
/// identical payloads never produce identical tokens.

use std::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use serde_json::Value;

use super::error::{CredentialError, CredentialResult};

/// Size of the vault key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Process-wide credential cipher.
///
/// Holds no mutable state, so one instance is shared behind an `Arc` by every
/// concurrent run.
#[derive(Clone)]
pub struct CredentialVault {
    cipher: XChaCha20Poly1305,
}

impl CredentialVault {
    /// Creates a vault from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidKeyLength`] unless the key is exactly
    /// [`KEY_SIZE`] bytes. Short keys are never padded.
    pub fn new(key: &[u8]) -> CredentialResult<Self> {
        if key.len() != KEY_SIZE {
            return Err(CredentialError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }
        let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| {
            CredentialError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            }
        })?;
        Ok(Self { cipher })
    }

    /// Creates a vault from a configured secret string (its UTF-8 bytes are the key).
    pub fn from_secret(secret: &str) -> CredentialResult<Self> {
        Self::new(secret.as_bytes())
    }

    /// Seals a structured payload into a `nonce:tag:ciphertext` token.
    pub fn encrypt(&self, payload: &Value) -> CredentialResult<String> {
        let plaintext = serde_json::to_vec(payload)?;
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| CredentialError::Encryption)?;

        // The AEAD output is `ciphertext || tag`
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(ciphertext)
        ))
    }

    /// Opens a token produced by [`CredentialVault::encrypt`].
    ///
    /// # Errors
    ///
    /// - [`CredentialError::MalformedToken`] if the token is not three hex parts
    ///   with the expected nonce and tag sizes
    /// - [`CredentialError::DecryptionFailed`] if authentication fails
    /// - [`CredentialError::Json`] if the plaintext is not JSON
    pub fn decrypt(&self, token: &str) -> CredentialResult<Value> {
        let parts: Vec<&str> = token.split(':').collect();
        let [nonce_hex, tag_hex, ciphertext_hex] = parts.as_slice() else {
            return Err(CredentialError::MalformedToken);
        };

        let nonce = hex::decode(nonce_hex).map_err(|_| CredentialError::MalformedToken)?;
        let tag = hex::decode(tag_hex).map_err(|_| CredentialError::MalformedToken)?;
        let ciphertext = hex::decode(ciphertext_hex).map_err(|_| CredentialError::MalformedToken)?;

        if nonce.len() != NONCE_SIZE || tag.len() != TAG_SIZE {
            return Err(CredentialError::MalformedToken);
        }

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| CredentialError::DecryptionFailed)?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &str = "fedcba9876543210fedcba9876543210";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let payload = json!({ "token": "sk-test-123", "scopes": ["read", "write"], "ttl": 3600 });

        let token = vault.encrypt(&payload).unwrap();
        assert_eq!(vault.decrypt(&token).unwrap(), payload);
    }

    #[test]
    fn test_token_shape() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let token = vault.encrypt(&json!({ "a": 1 })).unwrap();

        let parts: Vec<&str> = token.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), NONCE_SIZE * 2);
        assert_eq!(parts[1].len(), TAG_SIZE * 2);
        assert!(token.is_ascii());
    }

    #[test]
    fn test_same_payload_different_tokens() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let payload = json!({ "username": "admin", "password": "hunter2" });

        let first = vault.encrypt(&payload).unwrap();
        let second = vault.encrypt(&payload).unwrap();

        assert_ne!(first, second);
        assert_eq!(vault.decrypt(&first).unwrap(), payload);
        assert_eq!(vault.decrypt(&second).unwrap(), payload);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let other = CredentialVault::from_secret(OTHER_KEY).unwrap();

        let token = vault.encrypt(&json!({ "token": "abc" })).unwrap();
        assert!(matches!(other.decrypt(&token), Err(CredentialError::DecryptionFailed)));
    }

    #[test]
    fn test_decrypt_tampered_ciphertext() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let token = vault.encrypt(&json!({ "token": "abc" })).unwrap();

        let mut parts: Vec<String> = token.split(':').map(str::to_string).collect();
        let mut bytes = hex::decode(&parts[2]).unwrap();
        bytes[0] ^= 0x01;
        parts[2] = hex::encode(bytes);

        let tampered = parts.join(":");
        assert!(matches!(vault.decrypt(&tampered), Err(CredentialError::DecryptionFailed)));
    }

    #[test]
    fn test_decrypt_tampered_tag() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let token = vault.encrypt(&json!({ "token": "abc" })).unwrap();

        let mut parts: Vec<String> = token.split(':').map(str::to_string).collect();
        let mut tag = hex::decode(&parts[1]).unwrap();
        tag[TAG_SIZE - 1] ^= 0x80;
        parts[1] = hex::encode(tag);

        assert!(matches!(
            vault.decrypt(&parts.join(":")),
            Err(CredentialError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_decrypt_malformed_tokens() {
        let vault = CredentialVault::from_secret(KEY).unwrap();

        for token in ["", "abc", "aa:bb", "aa:bb:cc:dd", "zz:zz:zz"] {
            assert!(
                matches!(vault.decrypt(token), Err(CredentialError::MalformedToken)),
                "token {token:?} should be rejected as malformed"
            );
        }

        // Correct hex but nonce of the wrong size
        let short_nonce = format!("{}:{}:{}", "00".repeat(12), "00".repeat(TAG_SIZE), "00");
        assert!(matches!(vault.decrypt(&short_nonce), Err(CredentialError::MalformedToken)));
    }

    #[test]
    fn test_rejects_wrong_key_length() {
        for key in ["", "short", "0123456789abcdef0123456789abcdef0"] {
            let err = CredentialVault::from_secret(key).unwrap_err();
            assert!(matches!(
                err,
                CredentialError::InvalidKeyLength { expected: KEY_SIZE, .. }
            ));
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let vault = CredentialVault::from_secret(KEY).unwrap();
        let rendered = format!("{vault:?}");
        assert!(!rendered.contains(KEY));
        assert!(rendered.contains("REDACTED"));
    }
}
