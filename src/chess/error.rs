use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    InvalidFormat(String),
    IllegalMove(String),
    AmbiguousMove(String),
}

impl ChessError {
    /// Stable code used when the error crosses the wire
    pub fn code(&self) -> &'static str {
        match self {
            ChessError::InvalidFormat(_) => "INVALID_FORMAT",
            ChessError::IllegalMove(_) => "ILLEGAL_MOVE",
            ChessError::AmbiguousMove(_) => "AMBIGUOUS_MOVE",
        }
    }
}

impl fmt::Display for ChessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChessError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            ChessError::IllegalMove(msg) => write!(f, "Illegal move: {}", msg),
            ChessError::AmbiguousMove(msg) => write!(f, "Ambiguous move: {}", msg),
        }
    }
}

impl std::error::Error for ChessError {}
