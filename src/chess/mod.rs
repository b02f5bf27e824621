// Re-export all public items
pub use self::error::ChessError;
pub use self::movegen::{
    is_attacked, is_in_check, legal_moves, pseudo_legal_moves, status, GameStatus,
};
pub use self::moves::{CastleSide, Move};
pub use self::notation::{resolve, MoveToken};
pub use self::piece::{Color, Piece, PieceType};
pub use self::position::{CastlingRights, Position, STARTING_FEN};
pub use self::square::Square;

mod error;
pub mod movegen;
mod moves;
pub mod notation;
mod piece;
mod position;
mod square;
