use std::sync::Arc;

use biosig_core::{
    Availability, KeyAlias, KeyPairInfo, KeyPairOutcome, Outcome, PayloadSignatureProvider,
    PromptInfo, SignOutcome, SignatureRecord, VerifyOutcome,
};
use biosig_crypto::signature::{encode_base64, verify};
use biosig_crypto::{
    AuthenticatedSession, CryptoBinding, CryptoError, CryptoResult, SecureKeyStore,
    SessionPurpose,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::authenticator::BiometricAuthenticator;
use crate::outcome::{authentication_outcome, store_outcome};

/// Runs key creation, signing and verification behind a biometric prompt.
///
/// Each request binds the key under the manager's alias, shows the prompt
/// once, performs the crypto step on a match, and yields exactly one
/// [`Outcome`]. Failures never escape as errors: store failures become
/// `Outcome::Error`, authentication failures are classified by
/// [`crate::outcome::classify`].
///
/// The manager holds no per-request state. Running two requests at once
/// against one authenticator is the caller's problem.
#[derive(Clone)]
pub struct SignaturePromptManager {
    authenticator: Arc<dyn BiometricAuthenticator>,
    key_store: Arc<dyn SecureKeyStore>,
    alias: KeyAlias,
    auto_create_missing_key: bool,
    executor: Option<Handle>,
}

impl SignaturePromptManager {
    pub fn new(
        authenticator: Arc<dyn BiometricAuthenticator>,
        key_store: Arc<dyn SecureKeyStore>,
    ) -> Self {
        Self {
            authenticator,
            key_store,
            alias: KeyAlias::default(),
            auto_create_missing_key: false,
            executor: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<KeyAlias>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Generate a key on Sign/Verify when none exists under the alias.
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create_missing_key = enabled;
        self
    }

    /// Runtime the `spawn_*` callbacks run on.
    pub fn with_executor(mut self, executor: Handle) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn alias(&self) -> &KeyAlias {
        &self.alias
    }

    // ── Capability queries ───────────────────────────────────────────

    pub fn availability(&self) -> Availability {
        self.authenticator.can_authenticate()
    }

    pub fn is_supported(&self) -> bool {
        self.availability() != Availability::Unsupported
    }

    pub fn is_available(&self) -> bool {
        self.availability() == Availability::Available
    }

    /// No enrolled biometric or no sensor at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.availability(),
            Availability::NotEnrolled | Availability::NoHardware
        )
    }

    /// Whether the key under the alias was lost to an enrollment change.
    /// A missing key counts as changed.
    pub fn is_biometric_changed(&self) -> bool {
        self.key_store.is_invalidated(self.alias.as_str())
    }

    // ── Protocols ────────────────────────────────────────────────────

    /// Replace the key under the alias, then confirm it through the prompt.
    ///
    /// Generation happens before the prompt so the authentication
    /// requirement is attached at creation. Succeeds with the base64 public
    /// key.
    pub async fn create_key_pair(&self, info: &PromptInfo) -> KeyPairOutcome {
        let span = self.request_span("create_key_pair");
        async {
            let record = match self
                .key_store
                .generate_key_pair(self.alias.as_str(), info.invalidated_by_enrollment)
            {
                Ok(record) => record,
                Err(e) => return self.fail_store(&e),
            };
            let binding = CryptoBinding::new(SessionPurpose::CreateKeyPair, record.private_key);

            let session = match self.authenticate(info, binding).await {
                Ok(session) => session,
                Err(outcome) => return outcome,
            };
            session.finish();

            match self
                .key_store
                .get_public_key(self.alias.as_str())
                .and_then(|pk| pk.to_base64())
            {
                Ok(public_key) => Self::finish(Outcome::Succeeded(KeyPairInfo { public_key })),
                Err(e) => self.fail_store(&e),
            }
        }
        .instrument(span)
        .await
    }

    /// Sign the provider's payload with the existing key.
    pub async fn sign(
        &self,
        info: &PromptInfo,
        provider: &dyn PayloadSignatureProvider,
    ) -> SignOutcome {
        let span = self.request_span("sign");
        async {
            let session = match self.bind_and_authenticate(info, SessionPurpose::Sign).await {
                Ok(session) => session,
                Err(outcome) => return outcome,
            };

            let payload = provider.payload();
            match session.sign(payload.as_bytes()) {
                Ok(der) => Self::finish(Outcome::Succeeded(SignatureRecord {
                    signature: encode_base64(&der),
                    payload,
                })),
                Err(e) => self.fail_store(&e),
            }
        }
        .instrument(span)
        .await
    }

    /// Check the provider's signature over its payload against the stored
    /// public key. A mismatch is `Succeeded(false)`.
    ///
    /// The prompt is shown even though verification needs no secret, so
    /// verifying is gated exactly like signing.
    pub async fn verify(
        &self,
        info: &PromptInfo,
        provider: &dyn PayloadSignatureProvider,
    ) -> VerifyOutcome {
        let span = self.request_span("verify");
        async {
            let session = match self.bind_and_authenticate(info, SessionPurpose::Verify).await {
                Ok(session) => session,
                Err(outcome) => return outcome,
            };
            session.finish();

            match self.verify_with_stored_key(provider) {
                Ok(verified) => Self::finish(Outcome::Succeeded(verified)),
                Err(e) => self.fail_store(&e),
            }
        }
        .instrument(span)
        .await
    }

    // ── Callback forms ───────────────────────────────────────────────

    /// Run [`create_key_pair`](Self::create_key_pair) on the executor and
    /// hand the outcome to `on_result` once.
    ///
    /// # Panics
    ///
    /// Without an executor set, panics when called outside a tokio runtime.
    pub fn spawn_create_key_pair<F>(&self, info: PromptInfo, on_result: F) -> JoinHandle<()>
    where
        F: FnOnce(KeyPairOutcome) + Send + 'static,
    {
        let manager = self.clone();
        self.executor().spawn(async move {
            on_result(manager.create_key_pair(&info).await);
        })
    }

    pub fn spawn_sign<F>(
        &self,
        info: PromptInfo,
        provider: Arc<dyn PayloadSignatureProvider>,
        on_result: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(SignOutcome) + Send + 'static,
    {
        let manager = self.clone();
        self.executor().spawn(async move {
            on_result(manager.sign(&info, provider.as_ref()).await);
        })
    }

    pub fn spawn_verify<F>(
        &self,
        info: PromptInfo,
        provider: Arc<dyn PayloadSignatureProvider>,
        on_result: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(VerifyOutcome) + Send + 'static,
    {
        let manager = self.clone();
        self.executor().spawn(async move {
            on_result(manager.verify(&info, provider.as_ref()).await);
        })
    }

    // ── Internals ────────────────────────────────────────────────────

    fn executor(&self) -> Handle {
        self.executor.clone().unwrap_or_else(Handle::current)
    }

    fn request_span(&self, operation: &'static str) -> tracing::Span {
        let request_id = uuid::Uuid::new_v4();
        tracing::info_span!(
            "biometric_request",
            operation,
            alias = %self.alias,
            request_id = %request_id,
        )
    }

    /// Lock the existing key into a binding, generating one first when
    /// auto-create is on and the alias is empty.
    fn bind(&self, info: &PromptInfo, purpose: SessionPurpose) -> CryptoResult<CryptoBinding> {
        let alias = self.alias.as_str();
        match self.key_store.prepare_binding(alias, purpose) {
            Err(CryptoError::PrivateKeyNotFound(_)) if self.auto_create_missing_key => {
                tracing::info!("No key under alias, generating one before prompting");
                self.key_store
                    .generate_key_pair(alias, info.invalidated_by_enrollment)?;
                self.key_store.prepare_binding(alias, purpose)
            }
            other => other,
        }
    }

    async fn bind_and_authenticate<T>(
        &self,
        info: &PromptInfo,
        purpose: SessionPurpose,
    ) -> Result<AuthenticatedSession, Outcome<T>> {
        let binding = self.bind(info, purpose).map_err(|e| self.fail_store(&e))?;
        self.authenticate(info, binding).await
    }

    async fn authenticate<T>(
        &self,
        info: &PromptInfo,
        binding: CryptoBinding,
    ) -> Result<AuthenticatedSession, Outcome<T>> {
        self.authenticator
            .authenticate(info, binding)
            .await
            .map_err(|e| {
                tracing::warn!(code = %e.code, "Biometric authentication failed: {}", e.message);
                Self::finish(authentication_outcome(&e))
            })
    }

    fn verify_with_stored_key(&self, provider: &dyn PayloadSignatureProvider) -> CryptoResult<bool> {
        let public_key = self.key_store.get_public_key(self.alias.as_str())?;
        let payload = provider.payload();
        let signature = provider
            .signature()
            .ok_or_else(|| CryptoError::InvalidSignature("no signature supplied".into()))?;
        verify(&public_key, payload.as_bytes(), &signature)
    }

    fn fail_store<T>(&self, error: &CryptoError) -> Outcome<T> {
        tracing::warn!("Key store operation failed: {error}");
        Self::finish(store_outcome(error))
    }

    fn finish<T>(outcome: Outcome<T>) -> Outcome<T> {
        tracing::info!(status = %outcome.status(), "Request finished");
        outcome
    }
}
