use async_trait::async_trait;
use biosig_core::{AuthErrorCode, Availability, PromptInfo};
use biosig_crypto::{AuthenticatedSession, CryptoBinding};
use thiserror::Error;

/// Failure reported by an authenticator, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} [{code}]")]
pub struct AuthenticationError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthenticationError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The platform's biometric prompt.
///
/// Rendering and sensor matching happen behind this trait. Implementations
/// challenge the user once per [`authenticate`](Self::authenticate) call
/// and never retry on their own.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// Capability probe. No side effects.
    fn can_authenticate(&self) -> Availability;

    /// Show the prompt and, on a match, unlock `binding` via
    /// [`CryptoBinding::authorize`].
    async fn authenticate(
        &self,
        prompt: &PromptInfo,
        binding: CryptoBinding,
    ) -> Result<AuthenticatedSession, AuthenticationError>;
}
