use serde::{Deserialize, Serialize};

/// Result of the authenticator's capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    NotEnrolled,
    NoHardware,
    Unsupported,
}

/// Closed set of failure conditions an authenticator can report.
///
/// Numeric values follow the platform biometric prompt codes so that a
/// native bridge can hand its raw integer to [`AuthErrorCode::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorCode {
    HardwareUnavailable,
    UnableToProcess,
    Timeout,
    NoSpace,
    /// Operation canceled by the system (sensor became unavailable, app
    /// moved to background).
    Canceled,
    /// Too many failed attempts, sensor disabled for a while.
    Lockout,
    Vendor,
    /// Too many lockouts, a device credential is needed to reset.
    LockoutPermanent,
    UserCanceled,
    NoBiometrics,
    HardwareNotPresent,
    NegativeButton,
    NoDeviceCredential,
    SecurityUpdateRequired,
    /// Any code this crate does not know about.
    Unknown(i32),
}

impl AuthErrorCode {
    /// Every named code, in platform order.
    pub const KNOWN: [AuthErrorCode; 14] = [
        AuthErrorCode::HardwareUnavailable,
        AuthErrorCode::UnableToProcess,
        AuthErrorCode::Timeout,
        AuthErrorCode::NoSpace,
        AuthErrorCode::Canceled,
        AuthErrorCode::Lockout,
        AuthErrorCode::Vendor,
        AuthErrorCode::LockoutPermanent,
        AuthErrorCode::UserCanceled,
        AuthErrorCode::NoBiometrics,
        AuthErrorCode::HardwareNotPresent,
        AuthErrorCode::NegativeButton,
        AuthErrorCode::NoDeviceCredential,
        AuthErrorCode::SecurityUpdateRequired,
    ];

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => AuthErrorCode::HardwareUnavailable,
            2 => AuthErrorCode::UnableToProcess,
            3 => AuthErrorCode::Timeout,
            4 => AuthErrorCode::NoSpace,
            5 => AuthErrorCode::Canceled,
            7 => AuthErrorCode::Lockout,
            8 => AuthErrorCode::Vendor,
            9 => AuthErrorCode::LockoutPermanent,
            10 => AuthErrorCode::UserCanceled,
            11 => AuthErrorCode::NoBiometrics,
            12 => AuthErrorCode::HardwareNotPresent,
            13 => AuthErrorCode::NegativeButton,
            14 => AuthErrorCode::NoDeviceCredential,
            15 => AuthErrorCode::SecurityUpdateRequired,
            other => AuthErrorCode::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AuthErrorCode::HardwareUnavailable => 1,
            AuthErrorCode::UnableToProcess => 2,
            AuthErrorCode::Timeout => 3,
            AuthErrorCode::NoSpace => 4,
            AuthErrorCode::Canceled => 5,
            AuthErrorCode::Lockout => 7,
            AuthErrorCode::Vendor => 8,
            AuthErrorCode::LockoutPermanent => 9,
            AuthErrorCode::UserCanceled => 10,
            AuthErrorCode::NoBiometrics => 11,
            AuthErrorCode::HardwareNotPresent => 12,
            AuthErrorCode::NegativeButton => 13,
            AuthErrorCode::NoDeviceCredential => 14,
            AuthErrorCode::SecurityUpdateRequired => 15,
            AuthErrorCode::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthErrorCode::Unknown(code) => write!(f, "unknown({code})"),
            other => write!(f, "{other:?}({})", other.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_roundtrip_through_integer() {
        for code in AuthErrorCode::KNOWN {
            assert_eq!(AuthErrorCode::from_code(code.code()), code);
        }
    }

    #[test]
    fn unassigned_codes_are_unknown() {
        assert_eq!(AuthErrorCode::from_code(6), AuthErrorCode::Unknown(6));
        assert_eq!(AuthErrorCode::from_code(-1), AuthErrorCode::Unknown(-1));
        assert_eq!(AuthErrorCode::from_code(999).code(), 999);
    }

    #[test]
    fn known_codes_are_distinct() {
        let mut seen: Vec<i32> = AuthErrorCode::KNOWN.iter().map(|c| c.code()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), AuthErrorCode::KNOWN.len());
    }
}
