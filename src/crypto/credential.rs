//! Credential verification, the boundary between the hub and identity issuance.

use super::identity::{Identity, ParticipantId};
use base64::{engine::general_purpose, Engine as _};
use ed25519_dalek::{Signature, VerifyingKey};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Malformed credential: {0}")]
    Malformed(String),

    #[error("Credential signature does not verify")]
    BadSignature,
}

/// Maps an opaque credential to the participant it vouches for
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<ParticipantId, CredentialError>;
}

/// Accepts credentials signed by one server key
pub struct SignedCredentialVerifier {
    verifying_key: VerifyingKey,
}

impl SignedCredentialVerifier {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    pub fn for_identity(identity: &Identity) -> Self {
        Self::new(identity.verifying_key())
    }
}

impl CredentialVerifier for SignedCredentialVerifier {
    fn verify(&self, credential: &str) -> Result<ParticipantId, CredentialError> {
        let (participant, encoded) = credential
            .rsplit_once('.')
            .ok_or_else(|| CredentialError::Malformed("missing signature".to_string()))?;

        if participant.is_empty() {
            return Err(CredentialError::Malformed("empty participant".to_string()));
        }

        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CredentialError::Malformed(format!("signature encoding: {e}")))?;
        let bytes: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            CredentialError::Malformed(format!(
                "signature must be 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        let signature = Signature::from_bytes(&bytes);

        if Identity::verify(&self.verifying_key, participant.as_bytes(), &signature) {
            Ok(ParticipantId::from(participant))
        } else {
            Err(CredentialError::BadSignature)
        }
    }
}
