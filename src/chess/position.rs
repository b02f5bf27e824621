use super::moves::{CastleSide, Move};
use super::{ChessError, Color, Piece, PieceType, Square};
use std::fmt;
use std::str::FromStr;

/// Text of the canonical starting position
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Castling rights for both players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    /// All four rights available
    pub const fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    /// Parse the castling field (e.g., "KQkq", "Kq", "-")
    pub fn from_fen(field: &str) -> Result<Self, ChessError> {
        if field == "-" {
            return Ok(Self::none());
        }
        if field.is_empty() {
            return Err(ChessError::InvalidFormat(
                "Castling rights field cannot be empty".to_string(),
            ));
        }

        let mut rights = Self::none();
        let mut last_index: Option<usize> = None;

        for c in field.chars() {
            let index = match "KQkq".find(c) {
                Some(index) => index,
                None => {
                    return Err(ChessError::InvalidFormat(format!(
                        "Invalid castling rights character '{c}' (valid: K, Q, k, q, or - for none)"
                    )))
                }
            };
            // Duplicates and out-of-order letters would not survive a round trip
            if last_index.is_some_and(|last| index <= last) {
                return Err(ChessError::InvalidFormat(format!(
                    "Castling rights '{field}' must be unique and in KQkq order"
                )));
            }
            last_index = Some(index);

            match c {
                'K' => rights.white_kingside = true,
                'Q' => rights.white_queenside = true,
                'k' => rights.black_kingside = true,
                _ => rights.black_queenside = true,
            }
        }

        Ok(rights)
    }

    pub fn to_fen(&self) -> String {
        let mut result = String::new();

        if self.white_kingside {
            result.push('K');
        }
        if self.white_queenside {
            result.push('Q');
        }
        if self.black_kingside {
            result.push('k');
        }
        if self.black_queenside {
            result.push('q');
        }

        if result.is_empty() {
            "-".to_string()
        } else {
            result
        }
    }

    pub fn has(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::King) => self.white_kingside,
            (Color::White, CastleSide::Queen) => self.white_queenside,
            (Color::Black, CastleSide::King) => self.black_kingside,
            (Color::Black, CastleSide::Queen) => self.black_queenside,
        }
    }

    /// Remove castling rights for a color (when king moves)
    pub fn remove_all_for_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Remove the right tied to a rook home square (rook moved or was captured there)
    pub fn remove_rook_rights(&mut self, square: Square) {
        match (square.file, square.rank) {
            (0, 0) => self.white_queenside = false,
            (7, 0) => self.white_kingside = false,
            (0, 7) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

/// Immutable snapshot of a game position.
///
/// `Position` is `Copy`: applying a move returns a new value and leaves the
/// original untouched, so legality checks simulate a move and simply drop the
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// squares[rank][file] where rank 0 = rank 1, file 0 = file a
    squares: [[Option<Piece>; 8]; 8],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    /// The standard starting position
    pub fn starting() -> Self {
        let back_rank = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut squares = [[None; 8]; 8];
        for (file, &piece_type) in back_rank.iter().enumerate() {
            squares[0][file] = Some(Piece::new(piece_type, Color::White));
            squares[1][file] = Some(Piece::new(PieceType::Pawn, Color::White));
            squares[6][file] = Some(Piece::new(PieceType::Pawn, Color::Black));
            squares[7][file] = Some(Piece::new(piece_type, Color::Black));
        }

        Self {
            squares,
            side_to_move: Color::White,
            castling_rights: CastlingRights::all(),
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// A board with no pieces, White to move, no rights
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            side_to_move: Color::White,
            castling_rights: CastlingRights::none(),
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.rank as usize][square.file as usize]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// First square holding `color`'s king
    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::all().find(|&sq| self.piece_at(sq) == Some(Piece::new(PieceType::King, color)))
    }

    /// Squares occupied by pieces of `color`
    pub fn occupied_by(&self, color: Color) -> impl Iterator<Item = Square> + '_ {
        Square::all().filter(move |&sq| self.piece_at(sq).is_some_and(|p| p.color == color))
    }

    fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.rank as usize][square.file as usize] = piece;
    }

    /// Parse the six-field position text
    /// Example: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    pub fn from_fen(fen: &str) -> Result<Position, ChessError> {
        let parts: Vec<&str> = fen.split(' ').collect();
        let [placement, side, castling, en_passant, halfmove, fullmove] = parts.as_slice() else {
            let found_count = parts.len();
            return Err(ChessError::InvalidFormat(format!(
                "Position text must have exactly 6 space-separated fields, found {found_count}"
            )));
        };

        let squares = Self::parse_placement(placement)?;

        let side_to_move = match *side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => {
                return Err(ChessError::InvalidFormat(format!(
                    "Invalid side to move '{side}' (must be 'w' or 'b')"
                )))
            }
        };

        let castling_rights = CastlingRights::from_fen(castling)?;

        let en_passant_target = if *en_passant == "-" {
            None
        } else {
            let square: Square = en_passant.parse()?;
            if square.rank != 2 && square.rank != 5 {
                return Err(ChessError::InvalidFormat(format!(
                    "Invalid en passant target '{en_passant}' (must be on rank 3 or 6)"
                )));
            }
            Some(square)
        };

        let halfmove_clock = parse_counter(halfmove, "halfmove clock")?;
        let fullmove_number = parse_counter(fullmove, "fullmove number")?;
        if fullmove_number == 0 {
            return Err(ChessError::InvalidFormat(
                "Fullmove number must be at least 1".to_string(),
            ));
        }

        Ok(Position {
            squares,
            side_to_move,
            castling_rights,
            en_passant_target,
            halfmove_clock,
            fullmove_number,
        })
    }

    fn parse_placement(placement: &str) -> Result<[[Option<Piece>; 8]; 8], ChessError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            let found_ranks = ranks.len();
            return Err(ChessError::InvalidFormat(format!(
                "Piece placement must have exactly 8 ranks separated by '/', found {found_ranks}"
            )));
        }

        let mut squares = [[None; 8]; 8];

        // Text lists rank 8 first
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let board_rank = 7 - rank_idx;
            let rank_number = 8 - rank_idx;
            let mut file = 0usize;

            for c in rank_str.chars() {
                if let Some(run) = c.to_digit(10) {
                    let run = run as usize;
                    if !(1..=8).contains(&run) || file + run > 8 {
                        return Err(ChessError::InvalidFormat(format!(
                            "Invalid empty square count '{c}' in rank {rank_number}"
                        )));
                    }
                    file += run;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or_else(|| {
                        ChessError::InvalidFormat(format!(
                            "Invalid piece character '{c}' in rank {rank_number} (valid pieces: KQRBNPkqrbnp)"
                        ))
                    })?;
                    if file >= 8 {
                        return Err(ChessError::InvalidFormat(format!(
                            "Rank {rank_number} has more than 8 squares"
                        )));
                    }
                    squares[board_rank][file] = Some(piece);
                    file += 1;
                }
            }

            if file != 8 {
                return Err(ChessError::InvalidFormat(format!(
                    "Rank {rank_number} must represent exactly 8 squares, found {file}"
                )));
            }
        }

        Ok(squares)
    }

    /// Serialize to the six-field position text
    pub fn to_fen(&self) -> String {
        let placement = self.generate_piece_placement();
        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let castling = self.castling_rights.to_fen();
        let en_passant = match self.en_passant_target {
            Some(square) => square.to_string(),
            None => "-".to_string(),
        };
        let halfmove = self.halfmove_clock;
        let fullmove = self.fullmove_number;

        format!("{placement} {side} {castling} {en_passant} {halfmove} {fullmove}")
    }

    fn generate_piece_placement(&self) -> String {
        let mut ranks = Vec::with_capacity(8);

        for rank_idx in (0..8).rev() {
            let mut rank_string = String::new();
            let mut empty_count = 0;

            for file_idx in 0..8 {
                match self.squares[rank_idx][file_idx] {
                    Some(piece) => {
                        if empty_count > 0 {
                            rank_string.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        rank_string.push(piece.to_fen_char());
                    }
                    None => empty_count += 1,
                }
            }

            if empty_count > 0 {
                rank_string.push_str(&empty_count.to_string());
            }

            ranks.push(rank_string);
        }

        ranks.join("/")
    }

    /// Produce the position after `mv`.
    ///
    /// `mv` must come from the move generator for this position; it is not
    /// re-validated here.
    pub fn apply(&self, mv: &Move) -> Position {
        let mut next = *self;
        let color = self.side_to_move;

        next.set(mv.from, None);

        if mv.en_passant {
            // The captured pawn sits beside the origin, on the destination file
            next.set(Square::new_unchecked(mv.to.file, mv.from.rank), None);
        }

        if let Some(side) = mv.castle {
            let (rook_from, rook_to) = side.rook_files();
            let rank = mv.from.rank;
            next.set(Square::new_unchecked(rook_from, rank), None);
            next.set(
                Square::new_unchecked(rook_to, rank),
                Some(Piece::new(PieceType::Rook, color)),
            );
        }

        let placed = match mv.promotion {
            Some(promotion) => promotion,
            None if mv.reaches_last_rank() => PieceType::Queen,
            None => mv.piece,
        };
        next.set(mv.to, Some(Piece::new(placed, color)));

        match mv.piece {
            PieceType::King => next.castling_rights.remove_all_for_color(color),
            PieceType::Rook => next.castling_rights.remove_rook_rights(mv.from),
            _ => {}
        }
        if self
            .piece_at(mv.to)
            .is_some_and(|captured| captured.piece_type == PieceType::Rook)
        {
            next.castling_rights.remove_rook_rights(mv.to);
        }

        next.en_passant_target =
            if mv.piece == PieceType::Pawn && mv.from.rank.abs_diff(mv.to.rank) == 2 {
                Some(Square::new_unchecked(
                    mv.from.file,
                    (mv.from.rank + mv.to.rank) / 2,
                ))
            } else {
                None
            };

        if mv.piece == PieceType::Pawn || mv.capture {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }

        if color == Color::Black {
            next.fullmove_number += 1;
        }
        next.side_to_move = color.opposite();

        next
    }
}

/// Counters must be plain digit strings so the text round-trips exactly
fn parse_counter(field: &str, name: &str) -> Result<u32, ChessError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ChessError::InvalidFormat(format!(
            "Invalid {name} '{field}' (must be a non-negative integer)"
        )));
    }
    field.parse::<u32>().map_err(|e| {
        ChessError::InvalidFormat(format!("Invalid {name} '{field}': {e}"))
    })
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}
