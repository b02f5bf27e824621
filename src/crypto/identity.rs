use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use directories::ProjectDirs;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Verified identity of a player, as carried in credentials
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize)]
struct IdentityData {
    secret_key: String,
    public_key: String,
}

/// The server's Ed25519 signing identity
pub struct Identity {
    signing_key: SigningKey,
}

impl Identity {
    /// Generate a new random identity
    pub fn generate() -> Result<Self> {
        use rand::RngCore;
        let mut csprng = rand::rngs::OsRng;
        let mut secret_bytes = [0u8; 32];
        csprng.fill_bytes(&mut secret_bytes);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret_bytes),
        })
    }

    /// Load an identity from a JSON key file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read identity file {}", path.display()))?;

        let data: IdentityData =
            serde_json::from_str(&content).context("Failed to parse identity file")?;
        let secret_bytes = general_purpose::STANDARD
            .decode(&data.secret_key)
            .context("Invalid secret key encoding")?;

        let secret_array: [u8; 32] = secret_bytes.as_slice().try_into().map_err(|_| {
            anyhow::anyhow!(
                "Invalid secret key length: expected 32 bytes, got {}",
                secret_bytes.len()
            )
        })?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&secret_array),
        })
    }

    /// Save identity to `path`, readable only by the owner on unix
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let data = IdentityData {
            secret_key: general_purpose::STANDARD.encode(self.signing_key.to_bytes()),
            public_key: self.public_key_base64(),
        };
        let json = serde_json::to_string_pretty(&data).context("Failed to serialize identity")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write identity file {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict identity file permissions")?;
        }

        Ok(())
    }

    /// Load the identity at `path`, generating and saving one if it does not exist
    pub fn load_or_generate(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let identity = Self::generate()?;
        identity.save(path)?;
        info!("Generated new server identity at {}", path.display());
        Ok(identity)
    }

    /// Get the verifying (public) key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.verifying_key().to_bytes())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify a signature against a verifying key
    pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
        verifying_key.verify(message, signature).is_ok()
    }

    /// Issue a credential (`<participant>.<base64 signature>`) for a participant
    pub fn issue_credential(&self, participant: &ParticipantId) -> String {
        let signature = self.sign(participant.as_str().as_bytes());
        format!(
            "{}.{}",
            participant,
            general_purpose::STANDARD.encode(signature.to_bytes())
        )
    }
}

/// Get the default key storage path for the current platform
pub fn default_key_path() -> Result<PathBuf> {
    if let Ok(custom_data_dir) = std::env::var("GAMBIT_DATA_DIR") {
        return Ok(PathBuf::from(custom_data_dir).join("identity.json"));
    }

    let project_dirs = ProjectDirs::from("dev", "gambit", "gambit")
        .context("Failed to determine application config directory")?;
    Ok(project_dirs.config_dir().join("identity.json"))
}
