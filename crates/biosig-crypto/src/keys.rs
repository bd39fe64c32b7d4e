use p256::ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rand::Rng;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::signature::{decode_base64, encode_base64};

pub const SCALAR_SIZE: usize = 32;

// ── Public key ───────────────────────────────────────────────────────

/// NIST P-256 public key of a stored key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a DER SubjectPublicKeyInfo.
    pub fn from_der(der: &[u8]) -> CryptoResult<Self> {
        VerifyingKey::from_public_key_der(der)
            .map(Self)
            .map_err(|e| CryptoError::Serialization(e.to_string()))
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        Self::from_der(&decode_base64(encoded)?)
    }

    /// DER SubjectPublicKeyInfo bytes.
    pub fn to_der(&self) -> CryptoResult<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::Serialization(e.to_string()))
    }

    /// Base64 of the DER encoding, without line breaks.
    pub fn to_base64(&self) -> CryptoResult<String> {
        Ok(encode_base64(&self.to_der()?))
    }

    /// `-----BEGIN PUBLIC KEY-----` armored form.
    pub fn to_pem(&self) -> CryptoResult<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Serialization(e.to_string()))
    }

    /// Lowercase hex SHA-256 of the DER encoding.
    pub fn fingerprint(&self) -> CryptoResult<String> {
        let digest = Sha256::digest(self.to_der()?);
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fingerprint = self.fingerprint().unwrap_or_else(|_| "<unencodable>".into());
        f.debug_tuple("PublicKey").field(&fingerprint).finish()
    }
}

// ── Private key handle ───────────────────────────────────────────────

/// Opaque handle to a private key inside the store.
///
/// Signing through the handle is only reachable from an
/// [`AuthenticatedSession`](crate::session::AuthenticatedSession), so code
/// outside this crate can hold a handle but never use or read the scalar.
pub struct PrivateKeyHandle {
    alias: String,
    key: SigningKey,
}

impl PrivateKeyHandle {
    /// Fresh random key from the system CSPRNG.
    ///
    /// Draws are retried until they land in `[1, n)`.
    pub(crate) fn generate(alias: &str) -> CryptoResult<Self> {
        let mut rng = rand::rng();
        let mut scalar = [0u8; SCALAR_SIZE];
        let key = loop {
            rng.fill_bytes(&mut scalar);
            if let Ok(key) = SigningKey::from_slice(&scalar) {
                break key;
            }
        };
        scalar.zeroize();
        Ok(Self {
            alias: alias.to_string(),
            key,
        })
    }

    pub(crate) fn from_scalar(alias: &str, scalar: &[u8]) -> CryptoResult<Self> {
        let key = SigningKey::from_slice(scalar)
            .map_err(|e| CryptoError::UnrecoverableKey(format!("{alias}: {e}")))?;
        Ok(Self {
            alias: alias.to_string(),
            key,
        })
    }

    /// Caller must zeroize the returned bytes.
    pub(crate) fn scalar_bytes(&self) -> [u8; SCALAR_SIZE] {
        let mut out = [0u8; SCALAR_SIZE];
        out.copy_from_slice(&self.key.to_bytes());
        out
    }

    /// DER-encoded ECDSA/SHA-256 signature over `payload`.
    pub(crate) fn sign(&self, payload: &[u8]) -> CryptoResult<Vec<u8>> {
        let signature: Signature = self
            .key
            .try_sign(payload)
            .map_err(|_| CryptoError::SigningFailed)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.key.verifying_key().clone())
    }
}

impl std::fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("alias", &self.alias)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A key pair as returned by the store.
#[derive(Debug)]
pub struct KeyPairRecord {
    pub public_key: PublicKey,
    pub private_key: PrivateKeyHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_der_roundtrip() {
        let handle = PrivateKeyHandle::generate("k1").unwrap();
        let pk = handle.public_key();
        let parsed = PublicKey::from_base64(&pk.to_base64().unwrap()).unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn pem_is_armored() {
        let pem = PrivateKeyHandle::generate("k1")
            .unwrap()
            .public_key()
            .to_pem()
            .unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert!(pem.trim_end().ends_with("-----END PUBLIC KEY-----"));
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = PrivateKeyHandle::generate("k1")
            .unwrap()
            .public_key()
            .fingerprint()
            .unwrap();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn scalar_roundtrip_preserves_key() {
        let handle = PrivateKeyHandle::generate("k1").unwrap();
        let mut scalar = handle.scalar_bytes();
        let restored = PrivateKeyHandle::from_scalar("k1", &scalar).unwrap();
        scalar.zeroize();
        assert_eq!(restored.public_key(), handle.public_key());
    }

    #[test]
    fn generate_always_yields_usable_key() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let handle = PrivateKeyHandle::generate("k1").unwrap();
            assert!(handle.sign(b"payload").is_ok());
            assert!(seen.insert(handle.public_key().to_base64().unwrap()));
        }
    }

    #[test]
    fn zero_scalar_is_unrecoverable() {
        assert!(matches!(
            PrivateKeyHandle::from_scalar("k1", &[0u8; SCALAR_SIZE]),
            Err(CryptoError::UnrecoverableKey(_))
        ));
    }

    #[test]
    fn debug_redacts_private_key() {
        let handle = PrivateKeyHandle::generate("k1").unwrap();
        let dbg = format!("{handle:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(dbg.contains("k1"));
    }
}
