//! Capabilities the host application implements per signing identity.

use crate::biometric::SignatureRecord;

/// Supplies the payload to sign and, for verification, the signature to check.
///
/// Sign only calls [`payload`](Self::payload). Verify calls both.
pub trait PayloadSignatureProvider: Send + Sync {
    fn payload(&self) -> String;

    /// Base64 signature to verify against [`payload`](Self::payload).
    fn signature(&self) -> Option<String> {
        None
    }
}

/// Payload with no signature attached, for Sign requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainPayload(pub String);

impl PayloadSignatureProvider for PlainPayload {
    fn payload(&self) -> String {
        self.0.clone()
    }
}

/// Payload plus the signature produced by an earlier Sign request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub payload: String,
    pub signature: String,
}

impl SignedPayload {
    pub fn new(payload: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            signature: signature.into(),
        }
    }
}

impl PayloadSignatureProvider for SignedPayload {
    fn payload(&self) -> String {
        self.payload.clone()
    }

    fn signature(&self) -> Option<String> {
        Some(self.signature.clone())
    }
}

impl From<SignatureRecord> for SignedPayload {
    fn from(record: SignatureRecord) -> Self {
        Self {
            payload: record.payload,
            signature: record.signature,
        }
    }
}

impl PayloadSignatureProvider for SignatureRecord {
    fn payload(&self) -> String {
        self.payload.clone()
    }

    fn signature(&self) -> Option<String> {
        Some(self.signature.clone())
    }
}
