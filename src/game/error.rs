use crate::chess::ChessError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),

    #[error("Not your turn: {0} is to move")]
    TurnViolation(String),

    #[error("Game {0} is not active")]
    GameNotActive(String),

    #[error("{participant} is not playing in game {game_id}")]
    NotAParticipant {
        game_id: String,
        participant: String,
    },

    #[error("Game not found: {0}")]
    SessionNotFound(String),

    #[error("No pending draw offer from the opponent in game {0}")]
    NoDrawOffer(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl GameError {
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidFormat(_) => "INVALID_FORMAT",
            GameError::IllegalMove(_) => "ILLEGAL_MOVE",
            GameError::AmbiguousMove(_) => "AMBIGUOUS_MOVE",
            GameError::TurnViolation(_) => "TURN_VIOLATION",
            GameError::GameNotActive(_) => "GAME_NOT_ACTIVE",
            GameError::NotAParticipant { .. } => "NOT_A_PARTICIPANT",
            GameError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            GameError::NoDrawOffer(_) => "NO_DRAW_OFFER",
            GameError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<ChessError> for GameError {
    fn from(err: ChessError) -> Self {
        match err {
            ChessError::InvalidFormat(msg) => GameError::InvalidFormat(msg),
            ChessError::IllegalMove(msg) => GameError::IllegalMove(msg),
            ChessError::AmbiguousMove(msg) => GameError::AmbiguousMove(msg),
        }
    }
}
