//! Signature wire encoding and verification.
//!
//! Signatures travel as standard base64 of the ASN.1 DER ECDSA encoding,
//! with no line breaks.

use base64::{engine::general_purpose::STANDARD, Engine};
use p256::ecdsa::{signature::Verifier, Signature};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::PublicKey;

/// Base64-encode raw bytes and strip any line breaks.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes).replace(&['\r', '\n'][..], "")
}

/// Decode base64, tolerating embedded whitespace and line breaks.
pub fn decode_base64(encoded: &str) -> CryptoResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| CryptoError::Base64(e.to_string()))
}

/// Check a base64 DER signature over `payload`.
///
/// A mismatch is `Ok(false)`. Input that is not base64 or not a DER
/// signature is an error.
pub fn verify(public_key: &PublicKey, payload: &[u8], signature_b64: &str) -> CryptoResult<bool> {
    let der = decode_base64(signature_b64)?;
    let signature =
        Signature::from_der(&der).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    Ok(public_key
        .verifying_key()
        .verify(payload, &signature)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKeyHandle;

    #[test]
    fn encoding_has_no_line_breaks() {
        let long = vec![0xA5u8; 300];
        let encoded = encode_base64(&long);
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
        assert_eq!(decode_base64(&encoded).unwrap(), long);
    }

    #[test]
    fn decode_tolerates_wrapped_input() {
        let encoded = encode_base64(b"wrapped base64 input that spans lines");
        let (a, b) = encoded.split_at(10);
        let wrapped = format!("{a}\r\n{b}\n");
        assert_eq!(
            decode_base64(&wrapped).unwrap(),
            b"wrapped base64 input that spans lines"
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_base64("not*base64!"),
            Err(CryptoError::Base64(_))
        ));
    }

    #[test]
    fn verify_detects_payload_change() {
        let key = PrivateKeyHandle::generate("k1").unwrap();
        let der = key.sign(b"hello").unwrap();
        let encoded = encode_base64(&der);

        assert!(verify(&key.public_key(), b"hello", &encoded).unwrap());
        assert!(!verify(&key.public_key(), b"hellp", &encoded).unwrap());
    }

    #[test]
    fn verify_rejects_non_der_signature() {
        let key = PrivateKeyHandle::generate("k1").unwrap();
        let encoded = encode_base64(b"definitely not DER");
        assert!(matches!(
            verify(&key.public_key(), b"hello", &encoded),
            Err(CryptoError::InvalidSignature(_))
        ));
    }
}
