use super::piece::PieceType;
use super::square::Square;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    /// Files (from, to) the rook travels between when castling on this side
    pub fn rook_files(&self) -> (u8, u8) {
        match self {
            CastleSide::King => (7, 5),
            CastleSide::Queen => (0, 3),
        }
    }

    /// File the king lands on
    pub fn king_target_file(&self) -> u8 {
        match self {
            CastleSide::King => 6,
            CastleSide::Queen => 2,
        }
    }
}

/// A fully described move as produced by the generator.
///
/// Moves are plain data: applying one never validates it again, so only moves
/// returned by the generator should be fed to `Position::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceType,
    pub capture: bool,
    pub en_passant: bool,
    pub castle: Option<CastleSide>,
    pub promotion: Option<PieceType>,
}

impl Move {
    /// Create a quiet (non-capturing) move
    pub const fn quiet(piece: PieceType, from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            piece,
            capture: false,
            en_passant: false,
            castle: None,
            promotion: None,
        }
    }

    /// Create a capturing move
    pub const fn capture(piece: PieceType, from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            piece,
            capture: true,
            en_passant: false,
            castle: None,
            promotion: None,
        }
    }

    pub const fn en_passant(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            piece: PieceType::Pawn,
            capture: true,
            en_passant: true,
            castle: None,
            promotion: None,
        }
    }

    pub const fn castle(side: CastleSide, from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            piece: PieceType::King,
            capture: false,
            en_passant: false,
            castle: Some(side),
            promotion: None,
        }
    }

    /// Copy of this move with a promotion piece attached
    pub fn with_promotion(mut self, promotion: PieceType) -> Self {
        self.promotion = Some(promotion);
        self
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    pub fn is_castling(&self) -> bool {
        self.castle.is_some()
    }

    /// Whether a pawn making this move lands on its last rank
    pub fn reaches_last_rank(&self) -> bool {
        self.piece == PieceType::Pawn && (self.to.rank == 7 || self.to.rank == 0)
    }
}

// Coordinate form, e.g. "e2e4" or "e7e8q"
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}
