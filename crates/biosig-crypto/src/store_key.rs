use hkdf::Hkdf;
use rand::Rng;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead::KEY_SIZE;
use crate::error::{CryptoError, CryptoResult};

/// Wrapping key for private scalars held by the software key store.
///
/// Derived from a per-device secret so that copying the store file to
/// another machine does not carry usable keys with it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StoreKey {
    bytes: [u8; KEY_SIZE],
}

impl StoreKey {
    /// Random key for stores that never touch disk.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Derive the wrapping key for one store from the device secret.
    pub fn derive(device_secret: &[u8], store_id: &str) -> CryptoResult<Self> {
        let hk = Hkdf::<Sha256>::new(None, device_secret);
        let mut bytes = [0u8; KEY_SIZE];
        let info = format!("biosig-keystore:{}", store_id);
        hk.expand(info.as_bytes(), &mut bytes)
            .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
