//! Resolution of compact move tokens (`e4`, `Nbd7`, `exd6`, `O-O`, `e8=Q+`)
//! against the legal moves of a position.

use super::movegen::legal_moves;
use super::moves::{CastleSide, Move};
use super::{ChessError, PieceType, Position, Square};
use regex::Regex;
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<piece>[NBRQK])?(?P<file>[a-h])?(?P<rank>[1-8])?(?P<capture>x)?(?P<dest>[a-h][1-8])(?:=(?P<promotion>[NBRQ]))?$")
            .expect("move token pattern is valid")
    })
}

/// A move token broken into its grammatical parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveToken {
    Castle(CastleSide),
    Standard {
        piece: PieceType,
        from_file: Option<u8>,
        from_rank: Option<u8>,
        capture: bool,
        destination: Square,
        promotion: Option<PieceType>,
    },
}

impl MoveToken {
    /// Parse a token, stripping trailing `+`/`#` decoration.
    ///
    /// The decoration is never trusted; check and mate are recomputed after the
    /// move is applied.
    pub fn parse(token: &str) -> Result<Self, ChessError> {
        let body = token.trim_end_matches(&['+', '#'][..]);

        match body {
            "O-O" => return Ok(MoveToken::Castle(CastleSide::King)),
            "O-O-O" => return Ok(MoveToken::Castle(CastleSide::Queen)),
            _ => {}
        }

        let captures = token_pattern().captures(body).ok_or_else(|| {
            ChessError::InvalidFormat(format!("'{token}' is not a valid move token"))
        })?;

        let letter = |name: &str| captures.name(name).and_then(|m| m.as_str().chars().next());

        let piece = letter("piece")
            .and_then(PieceType::from_letter)
            .unwrap_or(PieceType::Pawn);
        let from_file = letter("file").map(|c| c as u8 - b'a');
        let from_rank = letter("rank").map(|c| c as u8 - b'1');
        let capture = captures.name("capture").is_some();
        let destination: Square = captures["dest"].parse()?;
        let promotion = letter("promotion").and_then(PieceType::from_letter);

        if promotion.is_some() && piece != PieceType::Pawn {
            return Err(ChessError::InvalidFormat(format!(
                "'{token}': only pawns carry a promotion suffix"
            )));
        }

        Ok(MoveToken::Standard {
            piece,
            from_file,
            from_rank,
            capture,
            destination,
            promotion,
        })
    }
}

/// Map `token` to exactly one legal move of `position`.
///
/// Zero candidates is `IllegalMove`, several is `AmbiguousMove`. A promotion
/// suffix must match a move onto the last rank; a last-rank pawn move without a
/// suffix promotes to a queen when applied.
pub fn resolve(position: &Position, token: &str) -> Result<Move, ChessError> {
    let parsed = MoveToken::parse(token)?;
    let legal = legal_moves(position);

    let (candidates, promotion): (Vec<Move>, Option<PieceType>) = match parsed {
        MoveToken::Castle(side) => (
            legal
                .into_iter()
                .filter(|mv| mv.castle == Some(side))
                .collect(),
            None,
        ),
        MoveToken::Standard {
            piece,
            from_file,
            from_rank,
            capture,
            destination,
            promotion,
        } => (
            legal
                .into_iter()
                .filter(|mv| mv.piece == piece && mv.to == destination && mv.capture == capture)
                .filter(|mv| !mv.is_castling())
                .filter(|mv| from_file.map_or(true, |file| mv.from.file == file))
                .filter(|mv| from_rank.map_or(true, |rank| mv.from.rank == rank))
                .collect(),
            promotion,
        ),
    };

    let mv = match candidates.as_slice() {
        [] => {
            return Err(ChessError::IllegalMove(format!(
                "'{token}' is not legal in this position"
            )))
        }
        [only] => *only,
        many => {
            return Err(ChessError::AmbiguousMove(format!(
                "'{token}' matches {} moves",
                many.len()
            )))
        }
    };

    match promotion {
        Some(piece) if mv.reaches_last_rank() => Ok(mv.with_promotion(piece)),
        Some(_) => Err(ChessError::IllegalMove(format!(
            "'{token}' does not reach the promotion rank"
        ))),
        None => Ok(mv),
    }
}
