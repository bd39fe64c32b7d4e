pub mod auth;
pub mod biometric;
pub mod config;
pub mod interfaces;
pub mod lifecycle;

pub use auth::{AuthErrorCode, Availability};
pub use biometric::{
    KeyAlias, KeyPairInfo, KeyPairOutcome, Outcome, PromptInfo, SignOutcome, SignatureRecord,
    Status, VerifyOutcome, DEFAULT_KEY_ALIAS,
};
pub use interfaces::{PayloadSignatureProvider, PlainPayload, SignedPayload};
