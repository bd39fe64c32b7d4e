use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use biosig_core::{AuthErrorCode, Availability, PromptInfo};
use biosig_crypto::{AuthenticatedSession, CryptoBinding, SessionPurpose};

use crate::authenticator::{AuthenticationError, BiometricAuthenticator};

/// What the simulated user does at the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    Match,
    Fail(AuthenticationError),
}

impl ScriptedResponse {
    pub fn fail(code: AuthErrorCode, message: impl Into<String>) -> Self {
        ScriptedResponse::Fail(AuthenticationError::new(code, message))
    }
}

/// Authenticator driven by a queue of scripted responses.
///
/// Matches whenever the queue is empty. Every prompt shown is recorded.
#[derive(Debug)]
pub struct SimulatedAuthenticator {
    availability: Mutex<Availability>,
    script: Mutex<VecDeque<ScriptedResponse>>,
    shown: Mutex<Vec<(PromptInfo, SessionPurpose)>>,
    latency: Option<Duration>,
}

impl Default for SimulatedAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAuthenticator {
    pub fn new() -> Self {
        Self {
            availability: Mutex::new(Availability::Available),
            script: Mutex::new(VecDeque::new()),
            shown: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Delay each answer, as a user taking time at the sensor would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_availability(&self, availability: Availability) {
        if let Ok(mut a) = self.availability.lock() {
            *a = availability;
        }
    }

    /// Queue the answer for a future prompt.
    pub fn push(&self, response: ScriptedResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(response);
        }
    }

    /// Prompts shown so far, with the purpose of the binding they unlocked.
    pub fn prompts_shown(&self) -> Vec<(PromptInfo, SessionPurpose)> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn unavailable_error(availability: Availability) -> Option<AuthenticationError> {
        match availability {
            Availability::Available => None,
            Availability::NotEnrolled => Some(AuthenticationError::new(
                AuthErrorCode::NoBiometrics,
                "No biometrics enrolled",
            )),
            Availability::NoHardware => Some(AuthenticationError::new(
                AuthErrorCode::HardwareNotPresent,
                "No biometric hardware",
            )),
            Availability::Unsupported => Some(AuthenticationError::new(
                AuthErrorCode::HardwareUnavailable,
                "Biometric authentication unsupported",
            )),
        }
    }
}

#[async_trait]
impl BiometricAuthenticator for SimulatedAuthenticator {
    fn can_authenticate(&self) -> Availability {
        self.availability
            .lock()
            .map(|a| *a)
            .unwrap_or(Availability::Unsupported)
    }

    async fn authenticate(
        &self,
        prompt: &PromptInfo,
        binding: CryptoBinding,
    ) -> Result<AuthenticatedSession, AuthenticationError> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((prompt.clone(), binding.purpose()));
        }
        if let Some(err) = Self::unavailable_error(self.can_authenticate()) {
            return Err(err);
        }

        let response = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(ScriptedResponse::Match);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match response {
            ScriptedResponse::Match => {
                tracing::debug!(alias = binding.alias(), "simulated biometric match");
                Ok(binding.authorize())
            }
            ScriptedResponse::Fail(err) => Err(err),
        }
    }
}
