pub mod aead;
pub mod error;
pub mod key_db;
pub mod key_store;
pub mod keys;
pub mod session;
pub mod signature;
pub mod store_key;

pub use error::{CryptoError, CryptoResult};
pub use key_db::KeyStoreDatabase;
pub use key_store::SecureKeyStore;
pub use keys::{KeyPairRecord, PrivateKeyHandle, PublicKey};
pub use session::{AuthenticatedSession, CryptoBinding, SessionPurpose};
