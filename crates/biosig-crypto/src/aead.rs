use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    XChaCha20Poly1305, XNonce,
};

use crate::error::{CryptoError, CryptoResult};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 24;

/// Seal `plaintext` with XChaCha20-Poly1305, authenticating `aad` alongside.
/// Returns (ciphertext, nonce) pair.
pub fn seal(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8; KEY_SIZE],
) -> CryptoResult<(Vec<u8>, [u8; NONCE_SIZE])> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(&nonce);
    Ok((ciphertext, nonce_bytes))
}

/// Open a sealed blob. Fails if the key, nonce, ciphertext or `aad` differ
/// from what was sealed.
pub fn open(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    key: &[u8; KEY_SIZE],
) -> CryptoResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::DecryptionFailed)
}
