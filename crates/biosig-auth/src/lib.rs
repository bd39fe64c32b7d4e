pub mod authenticator;
pub mod manager;
pub mod outcome;
pub mod simulator;

pub use authenticator::{AuthenticationError, BiometricAuthenticator};
pub use manager::SignaturePromptManager;
pub use simulator::{ScriptedResponse, SimulatedAuthenticator};
