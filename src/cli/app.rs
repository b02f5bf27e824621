use crate::crypto::{default_key_path, CredentialVerifier, Identity, SignedCredentialVerifier};
use crate::game::{RatingConfig, SessionManager, DEFAULT_K_FACTOR, DEFAULT_RATING};
use crate::hub::ConnectionHub;
use crate::matchmaking::{PairingQueue, DEFAULT_PAIRING_RETRIES};
use crate::messages::{WireConfig, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, MAX_MESSAGE_SIZE};
use crate::network::{Dispatcher, Server, DEFAULT_MAX_CONNECTIONS};
use crate::storage::Database;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Server configuration, persisted as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the game server listens on
    pub bind_addr: String,
    /// Data directory holding the database
    pub data_dir: PathBuf,
    /// Ed25519 key used to sign and verify credentials
    pub signing_key_file: PathBuf,
    pub default_rating: i32,
    pub k_factor: u32,
    pub max_message_size: usize,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub max_connections: usize,
    pub pairing_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = Self::default_data_dir().unwrap_or_else(|_| PathBuf::from("."));
        let signing_key_file =
            default_key_path().unwrap_or_else(|_| data_dir.join("identity.json"));
        Self {
            bind_addr: "127.0.0.1:7878".to_string(),
            data_dir,
            signing_key_file,
            default_rating: DEFAULT_RATING,
            k_factor: DEFAULT_K_FACTOR,
            max_message_size: MAX_MESSAGE_SIZE,
            read_timeout_secs: DEFAULT_READ_TIMEOUT.as_secs(),
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT.as_secs(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            pairing_retries: DEFAULT_PAIRING_RETRIES,
        }
    }
}

impl Config {
    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        if let Ok(custom_data_dir) = std::env::var("GAMBIT_DATA_DIR") {
            return Ok(PathBuf::from(custom_data_dir));
        }
        ProjectDirs::from("dev", "gambit", "gambit")
            .map(|proj_dirs| proj_dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    /// Get the default config file path
    pub fn default_config_file() -> Result<PathBuf> {
        ProjectDirs::from("dev", "gambit", "gambit")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Load configuration from `path`, or the platform default when `None`.
    ///
    /// A missing file is created with defaults. `GAMBIT_DATA_DIR` takes
    /// precedence over the stored data directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_file = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_file()?,
        };

        let mut config = Self::load_or_create(&config_file)?;
        if let Ok(custom_data_dir) = std::env::var("GAMBIT_DATA_DIR") {
            config.data_dir = PathBuf::from(custom_data_dir);
        }
        Ok(config)
    }

    /// Load configuration from file, creating it with defaults if it doesn't exist
    pub fn load_or_create(config_file: &Path) -> Result<Self> {
        if config_file.exists() {
            let content = std::fs::read_to_string(config_file).with_context(|| {
                format!("Failed to read configuration file: {}", config_file.display())
            })?;
            toml::from_str(&content).with_context(|| {
                format!("Failed to parse configuration file: {}", config_file.display())
            })
        } else {
            let config = Config::default();
            config.save(config_file)?;
            info!("Created default configuration at {}", config_file.display());
            Ok(config)
        }
    }

    pub fn save(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(config_file, content).context("Failed to write configuration file")?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("gambit.sqlite")
    }

    pub fn wire_config(&self) -> WireConfig {
        WireConfig::new(
            self.max_message_size,
            Duration::from_secs(self.read_timeout_secs),
            Duration::from_secs(self.write_timeout_secs),
        )
    }

    pub fn rating_config(&self) -> RatingConfig {
        RatingConfig {
            default_rating: self.default_rating,
            k_factor: self.k_factor,
        }
    }
}

/// Fully wired server state
pub struct App {
    pub config: Config,
    pub identity: Arc<Identity>,
    pub database: Database,
    pub hub: Arc<ConnectionHub>,
    pub sessions: Arc<SessionManager>,
    pub matchmaking: Arc<PairingQueue>,
    pub dispatcher: Arc<Dispatcher>,
}

impl App {
    /// Build the server stack on the configured database
    pub fn new(config: Config) -> Result<Self> {
        let database = Database::open(config.database_path()).with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path().display()
            )
        })?;
        Self::with_database(config, database)
    }

    /// Build the server stack on an in-memory database
    pub fn ephemeral(config: Config) -> Result<Self> {
        let database = Database::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_database(config, database)
    }

    fn with_database(config: Config, database: Database) -> Result<Self> {
        let identity = Arc::new(
            Identity::load_or_generate(&config.signing_key_file)
                .context("Failed to initialize signing identity")?,
        );
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(SignedCredentialVerifier::for_identity(&identity));
        let hub = Arc::new(ConnectionHub::new(verifier));

        let sessions = Arc::new(SessionManager::new(
            database.clone(),
            Arc::clone(&hub),
            config.rating_config(),
        ));
        let restored = sessions
            .restore()
            .context("Failed to restore active games")?;
        info!("Restored {} active game(s)", restored);

        let matchmaking = Arc::new(PairingQueue::new(
            Arc::clone(&sessions),
            config.pairing_retries,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&hub),
            Arc::clone(&sessions),
            Arc::clone(&matchmaking),
        ));

        Ok(Self {
            config,
            identity,
            database,
            hub,
            sessions,
            matchmaking,
            dispatcher,
        })
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn serve(self, bind_addr: &str, shutdown: impl Future<Output = ()>) -> Result<()> {
        let server = Server::bind(
            bind_addr,
            Arc::clone(&self.dispatcher),
            self.config.wire_config(),
            self.config.max_connections,
        )
        .await?;
        info!("Accepting players on {}", server.local_addr()?);
        server.run_until(shutdown).await?;

        let (operations, transactions, errors, total_ms) = self.database.stats().get_stats();
        info!(
            operations,
            transactions,
            errors,
            total_ms,
            "Server stopped, storage statistics"
        );
        Ok(())
    }
}
