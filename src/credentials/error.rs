/// Credential error types.

use thiserror::Error;

/// Result type for vault and credential store operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Errors raised while protecting or resolving credential material.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The vault key does not have the cipher's required length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    /// The token is not `nonce:tag:ciphertext` in hex.
    #[error("invalid credential token format, expected <nonce>:<tag>:<ciphertext> in hex")]
    MalformedToken,
    /// Authentication failed: wrong key or tampered token.
    #[error("credential decryption failed: token was tampered with or encrypted under another key")]
    DecryptionFailed,
    /// The cipher refused to encrypt the payload.
    #[error("credential encryption failed")]
    Encryption,
    /// The payload could not be serialized or the decrypted bytes are not JSON.
    #[error("credential payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    /// No credential is stored under the requested name.
    #[error("credential '{0}' not found")]
    NotFound(String),
    /// The run was started without a credential provider.
    #[error("no credential provider configured for this run")]
    NotConfigured,
    /// The backing store failed.
    #[error("credential storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for CredentialError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
