use crate::error::CryptoResult;
use crate::keys::{KeyPairRecord, PrivateKeyHandle, PublicKey};
use crate::session::{CryptoBinding, SessionPurpose};

/// Storage for EC key pairs whose private half is gated by biometrics.
///
/// Implementations report failures through the closed
/// [`CryptoError`](crate::error::CryptoError) set, so callers can classify
/// them without knowing the backing store.
pub trait SecureKeyStore: Send + Sync {
    /// Delete any key under `alias`, then generate a fresh P-256 key pair
    /// restricted to signing. With `invalidated_by_enrollment`, the key
    /// stops working once the enrolled biometric set changes.
    fn generate_key_pair(
        &self,
        alias: &str,
        invalidated_by_enrollment: bool,
    ) -> CryptoResult<KeyPairRecord>;

    /// Fails with `PublicKeyNotFound` when nothing is stored under `alias`.
    fn get_public_key(&self, alias: &str) -> CryptoResult<PublicKey>;

    /// Fails with `PrivateKeyNotFound` when nothing is stored under `alias`.
    /// Never creates a key.
    fn get_private_key(&self, alias: &str) -> CryptoResult<PrivateKeyHandle>;

    /// Idempotent. `false` only when the store itself could not be used.
    fn delete_key_pair(&self, alias: &str) -> bool;

    fn contains_alias(&self, alias: &str) -> CryptoResult<bool>;

    fn get_key_pair(&self, alias: &str) -> CryptoResult<KeyPairRecord> {
        let private_key = self.get_private_key(alias)?;
        let public_key = self.get_public_key(alias)?;
        Ok(KeyPairRecord {
            public_key,
            private_key,
        })
    }

    /// Lock the key under `alias` into a binding for one authenticated use.
    fn prepare_binding(&self, alias: &str, purpose: SessionPurpose) -> CryptoResult<CryptoBinding> {
        let key = self.get_private_key(alias)?;
        Ok(CryptoBinding::new(purpose, key))
    }

    /// Probe whether the key under `alias` has been lost to an enrollment
    /// change, without authenticating.
    ///
    /// A missing key counts as invalidated. Failures unrelated to
    /// enrollment report `false`.
    fn is_invalidated(&self, alias: &str) -> bool {
        match self.prepare_binding(alias, SessionPurpose::Sign) {
            Ok(_) => false,
            Err(e) => {
                let invalidated = e.indicates_biometric_change();
                tracing::debug!(alias, invalidated, "key probe failed: {e}");
                invalidated
            }
        }
    }
}
