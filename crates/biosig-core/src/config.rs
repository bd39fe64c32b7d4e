use serde::Deserialize;
use std::path::Path;

use crate::biometric::{KeyAlias, PromptInfo, DEFAULT_KEY_ALIAS};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub keystore: KeyStoreConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub authenticator: AuthenticatorConfig,
}

/// Software key store location and key policy.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyStoreConfig {
    #[serde(default = "default_keystore_path")]
    pub path: String,
    #[serde(default = "default_alias")]
    pub alias: String,
    /// Generate a key on Sign/Verify when none exists under the alias.
    #[serde(default)]
    pub auto_create_missing_key: bool,
}

fn default_keystore_path() -> String {
    "data/keystore.json".into()
}
fn default_alias() -> String {
    DEFAULT_KEY_ALIAS.into()
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            path: default_keystore_path(),
            alias: default_alias(),
            auto_create_missing_key: false,
        }
    }
}

impl KeyStoreConfig {
    pub fn key_alias(&self) -> KeyAlias {
        KeyAlias::new(self.alias.clone())
    }
}

/// Default texts for the biometric prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_negative_button")]
    pub negative_button: String,
    #[serde(default = "default_invalidated_by_enrollment")]
    pub invalidated_by_enrollment: bool,
}

fn default_title() -> String {
    "Biometric authentication".into()
}
fn default_negative_button() -> String {
    "Cancel".into()
}
fn default_invalidated_by_enrollment() -> bool {
    true
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: String::new(),
            description: String::new(),
            negative_button: default_negative_button(),
            invalidated_by_enrollment: default_invalidated_by_enrollment(),
        }
    }
}

impl PromptConfig {
    pub fn prompt_info(&self) -> PromptInfo {
        PromptInfo {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            description: self.description.clone(),
            negative_button: self.negative_button.clone(),
            invalidated_by_enrollment: self.invalidated_by_enrollment,
        }
    }
}

/// Which authenticator the binary wires in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatorConfig {
    /// `"console"` asks on the terminal, `"simulated"` always matches.
    #[serde(default = "default_auth_mode")]
    pub mode: String,
    /// Identifier of the currently enrolled biometric set.
    #[serde(default = "default_enrollment_id")]
    pub enrollment_id: String,
}

fn default_auth_mode() -> String {
    "console".into()
}
fn default_enrollment_id() -> String {
    "default".into()
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            mode: default_auth_mode(),
            enrollment_id: default_enrollment_id(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}
