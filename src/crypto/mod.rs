pub mod credential;
pub mod identity;

pub use credential::{CredentialError, CredentialVerifier, SignedCredentialVerifier};
pub use identity::{default_key_path, Identity, ParticipantId};
