use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] rusqlite::Error),

    #[error("Migration {version} failed: {reason}")]
    MigrationFailed { version: i32, reason: String },

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database path error: {0}")]
    DatabasePathError(String),
}

impl StorageError {
    pub fn migration_failed(version: i32, reason: impl Into<String>) -> Self {
        StorageError::MigrationFailed {
            version,
            reason: reason.into(),
        }
    }

    pub fn game_not_found(game_id: impl Into<String>) -> Self {
        StorageError::GameNotFound(game_id.into())
    }

    pub fn player_not_found(participant_id: impl Into<String>) -> Self {
        StorageError::PlayerNotFound(participant_id.into())
    }

    pub fn invalid_data(reason: impl Into<String>) -> Self {
        StorageError::InvalidData(reason.into())
    }

    pub fn database_path_error(reason: impl Into<String>) -> Self {
        StorageError::DatabasePathError(reason.into())
    }

    /// Whether retrying the same operation may succeed (lock contention on the file)
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::ConnectionFailed(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
