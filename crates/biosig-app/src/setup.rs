use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use biosig_auth::{BiometricAuthenticator, SignaturePromptManager, SimulatedAuthenticator};
use biosig_core::config::AppConfig;
use biosig_crypto::KeyStoreDatabase;

use crate::console::ConsoleAuthenticator;

/// Everything a command needs, wired from config.
pub struct Context {
    pub manager: SignaturePromptManager,
    pub store: Arc<KeyStoreDatabase>,
    pub config: AppConfig,
}

/// Open the key store and pick the authenticator named in config.
pub fn build_context(config: AppConfig) -> Result<Context> {
    let store = Arc::new(KeyStoreDatabase::open(
        Path::new(&config.keystore.path),
        config.authenticator.enrollment_id.clone(),
    )?);

    let authenticator: Arc<dyn BiometricAuthenticator> = match config.authenticator.mode.as_str() {
        "console" => Arc::new(ConsoleAuthenticator),
        "simulated" => Arc::new(SimulatedAuthenticator::new()),
        other => bail!("Unknown authenticator mode: {other}"),
    };
    tracing::debug!("Authenticator mode: {}", config.authenticator.mode);

    let manager = SignaturePromptManager::new(authenticator, store.clone())
        .with_alias(config.keystore.key_alias())
        .with_auto_create(config.keystore.auto_create_missing_key);

    Ok(Context {
        manager,
        store,
        config,
    })
}
