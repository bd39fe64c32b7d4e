use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rand::Rng;
use zeroize::Zeroize;

use crate::aead::{self, NONCE_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key_store::SecureKeyStore;
use crate::keys::{KeyPairRecord, PrivateKeyHandle, PublicKey};
use crate::signature::{decode_base64, encode_base64};
use crate::store_key::StoreKey;

const DEVICE_SECRET_SIZE: usize = 32;

/// Software key store keyed by alias.
///
/// Private scalars are sealed with a [`StoreKey`], with the alias bound in
/// as associated data. With a path the store persists as JSON after every
/// change; without one it lives in memory only.
///
/// Biometric enrollment is modelled by an opaque enrollment id. Keys
/// generated with `invalidated_by_enrollment` remember the id current at
/// creation and become permanently unusable once it changes.
#[derive(Debug)]
pub struct KeyStoreDatabase {
    state: Mutex<StoreState>,
    path: Option<PathBuf>,
    store_key: StoreKey,
}

#[derive(Debug)]
struct StoreState {
    entries: HashMap<String, KeyEntry>,
    enrollment_id: String,
}

/// One alias as persisted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct KeyEntry {
    /// Base64 DER SubjectPublicKeyInfo.
    public_key: String,
    sealed_private_key: Vec<u8>,
    nonce: [u8; NONCE_SIZE],
    invalidated_by_enrollment: bool,
    /// Enrollment the key is bound to, when `invalidated_by_enrollment`.
    bound_enrollment: Option<String>,
    created_at: DateTime<Utc>,
}

/// Serialized form of the store file.
#[derive(serde::Serialize, serde::Deserialize)]
struct KeyStoreContents {
    entries: HashMap<String, KeyEntry>,
}

impl KeyStoreDatabase {
    /// Empty store that never touches disk.
    pub fn in_memory(enrollment_id: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries: HashMap::new(),
                enrollment_id: enrollment_id.into(),
            }),
            path: None,
            store_key: StoreKey::generate(),
        }
    }

    /// Open the store at `path`, creating it on first use.
    ///
    /// The device secret lives next to the store file with a `.secret`
    /// extension and is generated when missing.
    pub fn open(path: &Path, enrollment_id: impl Into<String>) -> CryptoResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CryptoError::KeyStoreIo(e.to_string()))?;
            }
        }

        let secret = load_or_create_device_secret(&path.with_extension("secret"))?;
        let store_id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let store_key = StoreKey::derive(&secret, &store_id)?;

        let entries = if path.exists() {
            let bytes =
                std::fs::read(path).map_err(|e| CryptoError::KeyStoreIo(e.to_string()))?;
            let contents: KeyStoreContents = serde_json::from_slice(&bytes)
                .map_err(|e| CryptoError::Serialization(e.to_string()))?;
            contents.entries
        } else {
            HashMap::new()
        };
        tracing::debug!("Opened key store {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            state: Mutex::new(StoreState {
                entries,
                enrollment_id: enrollment_id.into(),
            }),
            path: Some(path.to_path_buf()),
            store_key,
        })
    }

    /// Record a change of the enrolled biometric set.
    pub fn set_enrollment(&self, enrollment_id: impl Into<String>) -> CryptoResult<()> {
        let mut state = self.lock()?;
        state.enrollment_id = enrollment_id.into();
        tracing::info!("Biometric enrollment changed to {}", state.enrollment_id);
        Ok(())
    }

    pub fn enrollment_id(&self) -> CryptoResult<String> {
        Ok(self.lock()?.enrollment_id.clone())
    }

    /// Stored aliases, sorted.
    pub fn aliases(&self) -> CryptoResult<Vec<String>> {
        let mut aliases: Vec<String> = self.lock()?.entries.keys().cloned().collect();
        aliases.sort();
        Ok(aliases)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> CryptoResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| CryptoError::KeyStoreIo("key store lock poisoned".into()))
    }

    /// Write `entries` to disk. Callers swap them into memory only after
    /// this succeeds, so a failed write leaves the store unchanged.
    fn persist(&self, entries: &HashMap<String, KeyEntry>) -> CryptoResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = KeyStoreContents {
            entries: entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&contents)
            .map_err(|e| CryptoError::Serialization(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| CryptoError::KeyStoreIo(e.to_string()))
    }

    fn seal_entry(
        &self,
        handle: &PrivateKeyHandle,
        public_key: &PublicKey,
        invalidated_by_enrollment: bool,
        enrollment_id: &str,
    ) -> CryptoResult<KeyEntry> {
        let mut scalar = handle.scalar_bytes();
        let sealed = aead::seal(&scalar, handle.alias().as_bytes(), self.store_key.as_bytes());
        scalar.zeroize();
        let (sealed_private_key, nonce) = sealed?;

        Ok(KeyEntry {
            public_key: public_key.to_base64()?,
            sealed_private_key,
            nonce,
            invalidated_by_enrollment,
            bound_enrollment: invalidated_by_enrollment.then(|| enrollment_id.to_string()),
            created_at: Utc::now(),
        })
    }
}

impl SecureKeyStore for KeyStoreDatabase {
    fn generate_key_pair(
        &self,
        alias: &str,
        invalidated_by_enrollment: bool,
    ) -> CryptoResult<KeyPairRecord> {
        let mut state = self
            .lock()
            .map_err(|e| CryptoError::GenerateKeyPair(e.to_string()))?;

        let mut entries = state.entries.clone();
        let replaced = entries.remove(alias).is_some();

        let private_key = PrivateKeyHandle::generate(alias)?;
        let public_key = private_key.public_key();
        let entry = self
            .seal_entry(
                &private_key,
                &public_key,
                invalidated_by_enrollment,
                &state.enrollment_id,
            )
            .map_err(|e| CryptoError::GenerateKeyPair(e.to_string()))?;
        entries.insert(alias.to_string(), entry);
        self.persist(&entries)
            .map_err(|e| CryptoError::GenerateKeyPair(e.to_string()))?;
        state.entries = entries;

        if replaced {
            tracing::info!(alias, "Replaced existing key pair");
        }

        tracing::info!(alias, invalidated_by_enrollment, "Generated P-256 key pair");
        Ok(KeyPairRecord {
            public_key,
            private_key,
        })
    }

    fn get_public_key(&self, alias: &str) -> CryptoResult<PublicKey> {
        let state = self.lock()?;
        let entry = state
            .entries
            .get(alias)
            .ok_or_else(|| CryptoError::PublicKeyNotFound(alias.to_string()))?;
        PublicKey::from_base64(&entry.public_key)
            .map_err(|e| CryptoError::PublicKeyNotFound(format!("{alias}: {e}")))
    }

    fn get_private_key(&self, alias: &str) -> CryptoResult<PrivateKeyHandle> {
        let state = self.lock()?;
        let entry = state
            .entries
            .get(alias)
            .ok_or_else(|| CryptoError::PrivateKeyNotFound(alias.to_string()))?;

        if let Some(bound) = &entry.bound_enrollment {
            if *bound != state.enrollment_id {
                return Err(CryptoError::KeyPairPermanentlyInvalidated(format!(
                    "{alias}: biometric enrollment changed since key creation"
                )));
            }
        }

        let mut scalar = aead::open(
            &entry.sealed_private_key,
            &entry.nonce,
            alias.as_bytes(),
            self.store_key.as_bytes(),
        )
        .map_err(|e| CryptoError::UnrecoverableKey(format!("{alias}: {e}")))?;
        let handle = PrivateKeyHandle::from_scalar(alias, &scalar);
        scalar.zeroize();
        handle
    }

    fn delete_key_pair(&self, alias: &str) -> bool {
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(alias, "Cannot delete key pair: {e}");
                return false;
            }
        };

        if !state.entries.contains_key(alias) {
            tracing::info!(alias, "Key pair does not exist");
            return true;
        }

        let mut entries = state.entries.clone();
        entries.remove(alias);
        match self.persist(&entries) {
            Ok(()) => {
                state.entries = entries;
                tracing::info!(alias, "Key pair deleted");
                true
            }
            Err(e) => {
                tracing::error!(alias, "Failed to persist key deletion: {e}");
                false
            }
        }
    }

    fn contains_alias(&self, alias: &str) -> CryptoResult<bool> {
        Ok(self.lock()?.entries.contains_key(alias))
    }
}

/// Load or create the per-device secret the store key is derived from.
///
/// The secret is stored base64-encoded with default file permissions and
/// is protected only by whatever access control the filesystem provides.
fn load_or_create_device_secret(path: &Path) -> CryptoResult<Vec<u8>> {
    if path.exists() {
        let encoded =
            std::fs::read_to_string(path).map_err(|e| CryptoError::KeyStoreIo(e.to_string()))?;
        return decode_base64(&encoded);
    }

    let mut secret = vec![0u8; DEVICE_SECRET_SIZE];
    rand::rng().fill_bytes(&mut secret);
    std::fs::write(path, encode_base64(&secret))
        .map_err(|e| CryptoError::KeyStoreIo(e.to_string()))?;
    tracing::info!("Generated new device secret at {}", path.display());
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPurpose;
    use crate::signature::verify;

    fn sign_with(store: &KeyStoreDatabase, alias: &str, payload: &[u8]) -> String {
        let session = store
            .prepare_binding(alias, SessionPurpose::Sign)
            .unwrap()
            .authorize();
        encode_base64(&session.sign(payload).unwrap())
    }

    #[test]
    fn generate_then_read_back() {
        let store = KeyStoreDatabase::in_memory("enrollment-1");
        let record = store.generate_key_pair("k1", true).unwrap();
        assert_eq!(store.get_public_key("k1").unwrap(), record.public_key);
        assert_eq!(store.get_private_key("k1").unwrap().alias(), "k1");
        assert!(store.contains_alias("k1").unwrap());
    }

    #[test]
    fn regenerate_replaces_key() {
        let store = KeyStoreDatabase::in_memory("enrollment-1");
        let first = store.generate_key_pair("k1", false).unwrap();
        let old_signature = sign_with(&store, "k1", b"hello");

        let second = store.generate_key_pair("k1", false).unwrap();
        assert_ne!(first.public_key, second.public_key);
        assert_eq!(store.len(), 1);

        let current = store.get_public_key("k1").unwrap();
        assert!(!verify(&current, b"hello", &old_signature).unwrap());
    }

    #[test]
    fn missing_alias_errors() {
        let store = KeyStoreDatabase::in_memory("e");
        assert!(matches!(
            store.get_public_key("nope"),
            Err(CryptoError::PublicKeyNotFound(_))
        ));
        assert!(matches!(
            store.get_private_key("nope"),
            Err(CryptoError::PrivateKeyNotFound(_))
        ));
        assert!(store.get_key_pair("nope").is_err());
    }

    #[test]
    fn private_key_lookup_never_creates() {
        let store = KeyStoreDatabase::in_memory("e");
        let _ = store.get_private_key("k1");
        assert!(store.is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let store = KeyStoreDatabase::in_memory("e");
        store.generate_key_pair("k1", true).unwrap();
        assert!(store.delete_key_pair("k1"));
        assert!(store.delete_key_pair("k1"));
        assert!(store.delete_key_pair("never-existed"));
        assert!(!store.contains_alias("k1").unwrap());
    }

    #[test]
    fn invalidation_probe() {
        let store = KeyStoreDatabase::in_memory("enrollment-1");
        assert!(store.is_invalidated("k1"));

        store.generate_key_pair("k1", true).unwrap();
        assert!(!store.is_invalidated("k1"));

        store.set_enrollment("enrollment-2").unwrap();
        assert!(store.is_invalidated("k1"));
        assert!(matches!(
            store.get_private_key("k1"),
            Err(CryptoError::KeyPairPermanentlyInvalidated(_))
        ));
        // Public half stays readable.
        assert!(store.get_public_key("k1").is_ok());
    }

    #[test]
    fn unbound_key_survives_enrollment_change() {
        let store = KeyStoreDatabase::in_memory("enrollment-1");
        store.generate_key_pair("k1", false).unwrap();
        store.set_enrollment("enrollment-2").unwrap();
        assert!(!store.is_invalidated("k1"));
    }

    #[test]
    fn regenerate_recovers_from_invalidation() {
        let store = KeyStoreDatabase::in_memory("enrollment-1");
        store.generate_key_pair("k1", true).unwrap();
        store.set_enrollment("enrollment-2").unwrap();
        assert!(store.is_invalidated("k1"));

        store.generate_key_pair("k1", true).unwrap();
        assert!(!store.is_invalidated("k1"));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");

        let (public_key, signature) = {
            let store = KeyStoreDatabase::open(&path, "enrollment-1").unwrap();
            let record = store.generate_key_pair("k1", true).unwrap();
            (record.public_key, sign_with(&store, "k1", b"hello"))
        };

        let reopened = KeyStoreDatabase::open(&path, "enrollment-1").unwrap();
        assert_eq!(reopened.aliases().unwrap(), vec!["k1".to_string()]);
        assert_eq!(reopened.get_public_key("k1").unwrap(), public_key);
        assert!(verify(&public_key, b"hello", &signature).unwrap());
        assert!(!reopened.is_invalidated("k1"));
    }

    #[test]
    fn reopen_with_new_enrollment_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        KeyStoreDatabase::open(&path, "enrollment-1")
            .unwrap()
            .generate_key_pair("k1", true)
            .unwrap();

        let reopened = KeyStoreDatabase::open(&path, "enrollment-2").unwrap();
        assert!(reopened.is_invalidated("k1"));
    }

    #[test]
    fn lost_device_secret_makes_key_unrecoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        KeyStoreDatabase::open(&path, "e")
            .unwrap()
            .generate_key_pair("k1", false)
            .unwrap();

        std::fs::remove_file(path.with_extension("secret")).unwrap();
        let reopened = KeyStoreDatabase::open(&path, "e").unwrap();
        assert!(matches!(
            reopened.get_private_key("k1"),
            Err(CryptoError::UnrecoverableKey(_))
        ));
        assert!(reopened.is_invalidated("k1"));
    }

    /// Replace the store file with a directory so the next write fails.
    fn break_store_file(path: &Path) {
        std::fs::remove_file(path).unwrap();
        std::fs::create_dir(path).unwrap();
    }

    #[test]
    fn failed_regenerate_keeps_previous_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        let store = KeyStoreDatabase::open(&path, "e").unwrap();
        let first = store.generate_key_pair("k1", false).unwrap();
        let signature = sign_with(&store, "k1", b"hello");

        break_store_file(&path);
        assert!(matches!(
            store.generate_key_pair("k1", false),
            Err(CryptoError::GenerateKeyPair(_))
        ));

        assert_eq!(store.len(), 1);
        let current = store.get_public_key("k1").unwrap();
        assert_eq!(current, first.public_key);
        assert!(verify(&current, b"hello", &signature).unwrap());
    }

    #[test]
    fn failed_generate_leaves_alias_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        let store = KeyStoreDatabase::open(&path, "e").unwrap();
        store.generate_key_pair("k1", false).unwrap();

        break_store_file(&path);
        assert!(store.generate_key_pair("k2", false).is_err());
        assert!(!store.contains_alias("k2").unwrap());
        assert_eq!(store.aliases().unwrap(), vec!["k1".to_string()]);
    }

    #[test]
    fn failed_delete_reports_false_and_keeps_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        let store = KeyStoreDatabase::open(&path, "e").unwrap();
        let record = store.generate_key_pair("k1", false).unwrap();

        break_store_file(&path);
        assert!(!store.delete_key_pair("k1"));
        assert!(store.contains_alias("k1").unwrap());
        assert_eq!(store.get_public_key("k1").unwrap(), record.public_key);
        assert!(store.get_private_key("k1").is_ok());
    }

    #[test]
    fn poisoned_lock_is_not_an_enrollment_change() {
        let store = KeyStoreDatabase::in_memory("e");
        store.generate_key_pair("k1", true).unwrap();

        std::thread::scope(|s| {
            let result = s
                .spawn(|| {
                    let _guard = store.state.lock().unwrap();
                    panic!("poison the key store lock");
                })
                .join();
            assert!(result.is_err());
        });

        assert!(matches!(
            store.get_private_key("k1"),
            Err(CryptoError::KeyStoreIo(_))
        ));
        assert!(matches!(
            store.get_public_key("k1"),
            Err(CryptoError::KeyStoreIo(_))
        ));
        assert!(!store.is_invalidated("k1"));
    }

    #[test]
    fn store_file_holds_no_plain_scalar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        let store = KeyStoreDatabase::open(&path, "e").unwrap();
        let record = store.generate_key_pair("k1", false).unwrap();

        let mut scalar = record.private_key.scalar_bytes();
        let file = std::fs::read(&path).unwrap();
        let as_json_array = serde_json::to_string(&scalar.to_vec()).unwrap();
        scalar.zeroize();
        assert!(!String::from_utf8_lossy(&file).contains(&as_json_array));
    }
}
