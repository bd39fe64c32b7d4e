use thiserror::Error;

use crate::session::SessionPurpose;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key pair generation failed: {0}")]
    GenerateKeyPair(String),

    #[error("Key pair permanently invalidated: {0}")]
    KeyPairPermanentlyInvalidated(String),

    #[error("Public key not found: {0}")]
    PublicKeyNotFound(String),

    #[error("Private key not found: {0}")]
    PrivateKeyNotFound(String),

    #[error("Private key unrecoverable: {0}")]
    UnrecoverableKey(String),

    #[error("Key store I/O error: {0}")]
    KeyStoreIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Base64 decode error: {0}")]
    Base64(String),

    #[error("Malformed signature: {0}")]
    InvalidSignature(String),

    #[error("Signing failed")]
    SigningFailed,

    #[error("Session was authorized for {got:?}, not {expected:?}")]
    SessionPurposeMismatch {
        expected: SessionPurpose,
        got: SessionPurpose,
    },

    #[error("AEAD encryption failed")]
    EncryptionFailed,

    #[error("AEAD decryption failed: ciphertext tampered or wrong key")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

impl CryptoError {
    /// Whether this failure means the key under an alias can no longer be
    /// used, which is read as "the enrolled biometrics changed".
    ///
    /// A missing key counts as changed.
    pub fn indicates_biometric_change(&self) -> bool {
        matches!(
            self,
            CryptoError::KeyPairPermanentlyInvalidated(_)
                | CryptoError::UnrecoverableKey(_)
                | CryptoError::PrivateKeyNotFound(_)
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
