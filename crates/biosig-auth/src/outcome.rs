//! Classification of authenticator and store failures into [`Outcome`]s.

use biosig_core::{AuthErrorCode, Outcome, Status};
use biosig_crypto::CryptoError;

use crate::authenticator::AuthenticationError;

/// Map an authenticator error code to the status callers see.
///
/// Total over every code; anything not listed below is `Error`.
pub fn classify(code: AuthErrorCode) -> Status {
    match code {
        AuthErrorCode::Canceled | AuthErrorCode::NegativeButton | AuthErrorCode::UserCanceled => {
            Status::Canceled
        }
        AuthErrorCode::Lockout => Status::LockedOut,
        AuthErrorCode::LockoutPermanent => Status::LockedOutPermanent,
        AuthErrorCode::HardwareUnavailable
        | AuthErrorCode::UnableToProcess
        | AuthErrorCode::Timeout
        | AuthErrorCode::NoSpace
        | AuthErrorCode::Vendor
        | AuthErrorCode::NoBiometrics
        | AuthErrorCode::HardwareNotPresent
        | AuthErrorCode::NoDeviceCredential
        | AuthErrorCode::SecurityUpdateRequired
        | AuthErrorCode::Unknown(_) => Status::Error,
    }
}

/// Outcome for a failed authentication, carrying the platform's message.
pub fn authentication_outcome<T>(error: &AuthenticationError) -> Outcome<T> {
    Outcome::failure(classify(error.code), error.message.clone())
}

/// Store and crypto failures all surface as `Error` with their message.
pub fn store_outcome<T>(error: &CryptoError) -> Outcome<T> {
    Outcome::Error(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_family() {
        for code in [
            AuthErrorCode::Canceled,
            AuthErrorCode::NegativeButton,
            AuthErrorCode::UserCanceled,
        ] {
            assert_eq!(classify(code), Status::Canceled, "{code}");
        }
    }

    #[test]
    fn lockouts() {
        assert_eq!(classify(AuthErrorCode::Lockout), Status::LockedOut);
        assert_eq!(
            classify(AuthErrorCode::LockoutPermanent),
            Status::LockedOutPermanent
        );
    }

    #[test]
    fn every_code_maps_to_a_failure_status() {
        for raw in -5..64 {
            let status = classify(AuthErrorCode::from_code(raw));
            assert_ne!(status, Status::Succeeded, "code {raw}");
        }
    }

    #[test]
    fn unknown_codes_are_errors() {
        assert_eq!(classify(AuthErrorCode::Unknown(6)), Status::Error);
        assert_eq!(classify(AuthErrorCode::from_code(4242)), Status::Error);
    }

    #[test]
    fn classification_is_stable() {
        for code in AuthErrorCode::KNOWN {
            assert_eq!(classify(code), classify(code));
        }
    }

    #[test]
    fn authentication_outcome_keeps_message() {
        let err = AuthenticationError::new(AuthErrorCode::NegativeButton, "Cancel pressed");
        let outcome: Outcome<bool> = authentication_outcome(&err);
        assert_eq!(outcome, Outcome::Canceled("Cancel pressed".into()));
    }

    #[test]
    fn store_errors_fold_to_error() {
        let outcome: Outcome<bool> =
            store_outcome(&CryptoError::KeyPairPermanentlyInvalidated("k1".into()));
        assert_eq!(outcome.status(), Status::Error);
        assert!(outcome.error().unwrap().contains("k1"));
    }
}
