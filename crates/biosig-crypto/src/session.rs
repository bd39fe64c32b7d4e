//! One-shot crypto contexts coupling a biometric match to one key use.
//!
//! A [`CryptoBinding`] is prepared before the prompt is shown. The
//! authenticator turns it into an [`AuthenticatedSession`] after a
//! successful match, and the session is consumed by exactly one operation.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::PrivateKeyHandle;

/// Which request a binding was prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPurpose {
    CreateKeyPair,
    Sign,
    Verify,
}

/// A signing context bound to one alias, locked until authentication.
#[derive(Debug)]
pub struct CryptoBinding {
    purpose: SessionPurpose,
    key: PrivateKeyHandle,
}

impl CryptoBinding {
    pub fn new(purpose: SessionPurpose, key: PrivateKeyHandle) -> Self {
        Self { purpose, key }
    }

    pub fn alias(&self) -> &str {
        self.key.alias()
    }

    pub fn purpose(&self) -> SessionPurpose {
        self.purpose
    }

    /// Unlock the binding. Only an authenticator calls this, after the
    /// user has been matched.
    pub fn authorize(self) -> AuthenticatedSession {
        AuthenticatedSession {
            purpose: self.purpose,
            key: self.key,
        }
    }
}

/// An unlocked binding. Every method takes `self`, so a session is used once.
#[derive(Debug)]
pub struct AuthenticatedSession {
    purpose: SessionPurpose,
    key: PrivateKeyHandle,
}

impl AuthenticatedSession {
    pub fn alias(&self) -> &str {
        self.key.alias()
    }

    pub fn purpose(&self) -> SessionPurpose {
        self.purpose
    }

    /// Sign `payload` with the bound key, returning the DER signature.
    pub fn sign(self, payload: &[u8]) -> CryptoResult<Vec<u8>> {
        if self.purpose != SessionPurpose::Sign {
            return Err(CryptoError::SessionPurposeMismatch {
                expected: SessionPurpose::Sign,
                got: self.purpose,
            });
        }
        self.key.sign(payload)
    }

    /// Release the session without signing.
    pub fn finish(self) {
        tracing::debug!(alias = %self.alias(), purpose = ?self.purpose, "session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{encode_base64, verify};

    #[test]
    fn sign_session_produces_verifiable_signature() {
        let key = PrivateKeyHandle::generate("k1").unwrap();
        let public = key.public_key();
        let session = CryptoBinding::new(SessionPurpose::Sign, key).authorize();
        assert_eq!(session.alias(), "k1");

        let der = session.sign(b"payload").unwrap();
        assert!(verify(&public, b"payload", &encode_base64(&der)).unwrap());
    }

    #[test]
    fn verify_session_refuses_to_sign() {
        let key = PrivateKeyHandle::generate("k1").unwrap();
        let session = CryptoBinding::new(SessionPurpose::Verify, key).authorize();
        assert!(matches!(
            session.sign(b"payload"),
            Err(CryptoError::SessionPurposeMismatch {
                expected: SessionPurpose::Sign,
                got: SessionPurpose::Verify,
            })
        ));
    }

    #[test]
    fn binding_reports_purpose() {
        let key = PrivateKeyHandle::generate("k9").unwrap();
        let binding = CryptoBinding::new(SessionPurpose::CreateKeyPair, key);
        assert_eq!(binding.purpose(), SessionPurpose::CreateKeyPair);
        assert_eq!(binding.alias(), "k9");
        binding.authorize().finish();
    }
}
