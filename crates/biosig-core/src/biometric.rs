use serde::{Deserialize, Serialize};

/// Alias used when the host application does not name its own key.
pub const DEFAULT_KEY_ALIAS: &str = "biosig.signature.key";

// ── Key alias ────────────────────────────────────────────────────────

/// Stable identifier of one key pair inside the secure store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyAlias(String);

impl KeyAlias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for KeyAlias {
    fn default() -> Self {
        Self(DEFAULT_KEY_ALIAS.into())
    }
}

impl std::fmt::Display for KeyAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyAlias {
    fn from(alias: &str) -> Self {
        Self(alias.to_string())
    }
}

impl From<String> for KeyAlias {
    fn from(alias: String) -> Self {
        Self(alias)
    }
}

impl AsRef<str> for KeyAlias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Prompt ───────────────────────────────────────────────────────────

/// Texts shown on the biometric prompt plus the key policy for one request.
///
/// Built by the caller per operation and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInfo {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub negative_button: String,
    /// Whether a key created under this prompt stops working once the
    /// enrolled biometric set changes.
    pub invalidated_by_enrollment: bool,
}

// ── Results ──────────────────────────────────────────────────────────

/// Flat status tag of an [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Succeeded,
    Error,
    Canceled,
    LockedOut,
    LockedOutPermanent,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Succeeded => "SUCCEEDED",
            Status::Error => "ERROR",
            Status::Canceled => "CANCELED",
            Status::LockedOut => "LOCKED_OUT",
            Status::LockedOutPermanent => "LOCKED_OUT_PERMANENT",
        };
        f.write_str(s)
    }
}

/// Public half of a freshly created key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairInfo {
    /// Base64 of the DER SubjectPublicKeyInfo, without line breaks.
    pub public_key: String,
}

/// A signature and the payload it was produced over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Base64 of the DER ECDSA signature, without line breaks.
    pub signature: String,
    pub payload: String,
}

/// The single terminal result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome<T> {
    Succeeded(T),
    Error(String),
    Canceled(String),
    LockedOut(String),
    LockedOutPermanent(String),
}

pub type KeyPairOutcome = Outcome<KeyPairInfo>;
pub type SignOutcome = Outcome<SignatureRecord>;
pub type VerifyOutcome = Outcome<bool>;

impl<T> Outcome<T> {
    /// Build a failed outcome for a classified status.
    ///
    /// `Status::Succeeded` carries no data, so it is reported as `Error`.
    pub fn failure(status: Status, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            Status::Canceled => Outcome::Canceled(message),
            Status::LockedOut => Outcome::LockedOut(message),
            Status::LockedOutPermanent => Outcome::LockedOutPermanent(message),
            Status::Error | Status::Succeeded => Outcome::Error(message),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Outcome::Succeeded(_) => Status::Succeeded,
            Outcome::Error(_) => Status::Error,
            Outcome::Canceled(_) => Status::Canceled,
            Outcome::LockedOut(_) => Status::LockedOut,
            Outcome::LockedOutPermanent(_) => Status::LockedOutPermanent,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    /// Failure message, `None` on success.
    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Succeeded(_) => None,
            Outcome::Error(m)
            | Outcome::Canceled(m)
            | Outcome::LockedOut(m)
            | Outcome::LockedOutPermanent(m) => Some(m),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Succeeded(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Succeeded(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Succeeded(v) => Outcome::Succeeded(f(v)),
            Outcome::Error(m) => Outcome::Error(m),
            Outcome::Canceled(m) => Outcome::Canceled(m),
            Outcome::LockedOut(m) => Outcome::LockedOut(m),
            Outcome::LockedOutPermanent(m) => Outcome::LockedOutPermanent(m),
        }
    }
}
