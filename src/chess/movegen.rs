//! Pseudo-legal and legal move generation plus attack detection.
//!
//! Legality is decided by simulation: every pseudo-legal move is applied to a
//! copy of the position and dropped when it leaves the mover's king attacked.

use super::moves::{CastleSide, Move};
use super::{Color, Piece, PieceType, Position, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Outcome of evaluating the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}

/// Pseudo-legal moves for the piece on `square`, ignoring whether the mover's
/// king ends up attacked. Empty squares yield no moves.
pub fn pseudo_legal_moves(position: &Position, square: Square) -> Vec<Move> {
    let mut moves = Vec::new();
    let Some(piece) = position.piece_at(square) else {
        return moves;
    };

    match piece.piece_type {
        PieceType::Pawn => pawn_moves(position, square, piece.color, &mut moves),
        PieceType::Knight => step_moves(position, square, piece, &KNIGHT_OFFSETS, &mut moves),
        PieceType::Bishop => slide_moves(position, square, piece, &DIAGONAL, &mut moves),
        PieceType::Rook => slide_moves(position, square, piece, &ORTHOGONAL, &mut moves),
        PieceType::Queen => {
            slide_moves(position, square, piece, &ORTHOGONAL, &mut moves);
            slide_moves(position, square, piece, &DIAGONAL, &mut moves);
        }
        PieceType::King => {
            step_moves(position, square, piece, &KING_OFFSETS, &mut moves);
            castle_moves(position, square, piece.color, &mut moves);
        }
    }

    moves
}

fn pawn_moves(position: &Position, from: Square, color: Color, moves: &mut Vec<Move>) {
    let direction = color.pawn_direction();
    let start_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    if let Some(one) = from.offset(0, direction) {
        if position.piece_at(one).is_none() {
            moves.push(Move::quiet(PieceType::Pawn, from, one));

            if from.rank == start_rank {
                if let Some(two) = one.offset(0, direction) {
                    if position.piece_at(two).is_none() {
                        moves.push(Move::quiet(PieceType::Pawn, from, two));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(target) = from.offset(df, direction) else {
            continue;
        };
        match position.piece_at(target) {
            Some(occupant) if occupant.color != color => {
                moves.push(Move::capture(PieceType::Pawn, from, target));
            }
            None if position.en_passant_target() == Some(target) => {
                moves.push(Move::en_passant(from, target));
            }
            _ => {}
        }
    }
}

fn step_moves(
    position: &Position,
    from: Square,
    piece: Piece,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in offsets {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match position.piece_at(to) {
            None => moves.push(Move::quiet(piece.piece_type, from, to)),
            Some(occupant) if occupant.color != piece.color => {
                moves.push(Move::capture(piece.piece_type, from, to))
            }
            Some(_) => {}
        }
    }
}

fn slide_moves(
    position: &Position,
    from: Square,
    piece: Piece,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in directions {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match position.piece_at(to) {
                None => moves.push(Move::quiet(piece.piece_type, from, to)),
                Some(occupant) => {
                    if occupant.color != piece.color {
                        moves.push(Move::capture(piece.piece_type, from, to));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

fn castle_moves(position: &Position, from: Square, color: Color, moves: &mut Vec<Move>) {
    let rank = color.back_rank();
    if from != Square::new_unchecked(4, rank) {
        return;
    }
    let enemy = color.opposite();

    for side in [CastleSide::King, CastleSide::Queen] {
        if !position.castling_rights().has(color, side) {
            continue;
        }

        let (rook_file, _) = side.rook_files();
        let rook_square = Square::new_unchecked(rook_file, rank);
        if position.piece_at(rook_square) != Some(Piece::new(PieceType::Rook, color)) {
            continue;
        }

        let (low, high) = if rook_file < from.file {
            (rook_file + 1, from.file)
        } else {
            (from.file + 1, rook_file)
        };
        let path_clear = (low..high)
            .all(|file| position.piece_at(Square::new_unchecked(file, rank)).is_none());
        if !path_clear {
            continue;
        }

        // The king may not start in, pass through, or land on an attacked square
        let target_file = side.king_target_file();
        let step: i8 = if target_file > from.file { 1 } else { -1 };
        let crossed = [
            from,
            Square::new_unchecked((from.file as i8 + step) as u8, rank),
            Square::new_unchecked(target_file, rank),
        ];
        if crossed.iter().any(|&sq| is_attacked(position, sq, enemy)) {
            continue;
        }

        moves.push(Move::castle(
            side,
            from,
            Square::new_unchecked(target_file, rank),
        ));
    }
}

/// Whether any piece of `by_color` attacks `square`
pub fn is_attacked(position: &Position, square: Square, by_color: Color) -> bool {
    let holds = |sq: Square, kinds: &[PieceType]| {
        position
            .piece_at(sq)
            .is_some_and(|p| p.color == by_color && kinds.contains(&p.piece_type))
    };

    // A pawn attacks diagonally forward, so look one rank back from its view
    let pawn_rank_delta = -by_color.pawn_direction();
    for df in [-1, 1] {
        if let Some(sq) = square.offset(df, pawn_rank_delta) {
            if holds(sq, &[PieceType::Pawn]) {
                return true;
            }
        }
    }

    for &(df, dr) in &KNIGHT_OFFSETS {
        if let Some(sq) = square.offset(df, dr) {
            if holds(sq, &[PieceType::Knight]) {
                return true;
            }
        }
    }

    for &(df, dr) in &KING_OFFSETS {
        if let Some(sq) = square.offset(df, dr) {
            if holds(sq, &[PieceType::King]) {
                return true;
            }
        }
    }

    let rays = [
        (&ORTHOGONAL, [PieceType::Rook, PieceType::Queen]),
        (&DIAGONAL, [PieceType::Bishop, PieceType::Queen]),
    ];
    for (directions, sliders) in rays {
        for &(df, dr) in directions.iter() {
            let mut current = square;
            while let Some(sq) = current.offset(df, dr) {
                if position.piece_at(sq).is_some() {
                    if holds(sq, &sliders) {
                        return true;
                    }
                    break;
                }
                current = sq;
            }
        }
    }

    false
}

/// Whether `color`'s king is attacked. A missing king is never in check.
pub fn is_in_check(position: &Position, color: Color) -> bool {
    position
        .king_square(color)
        .is_some_and(|king| is_attacked(position, king, color.opposite()))
}

/// Every legal move for the side to move
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let mover = position.side_to_move();
    position
        .occupied_by(mover)
        .flat_map(|square| pseudo_legal_moves(position, square))
        .filter(|mv| !is_in_check(&position.apply(mv), mover))
        .collect()
}

/// Checkmate/stalemate/check evaluation for the side to move
pub fn status(position: &Position) -> GameStatus {
    let in_check = is_in_check(position, position.side_to_move());
    let has_moves = !legal_moves(position).is_empty();

    match (in_check, has_moves) {
        (true, false) => GameStatus::Checkmate,
        (false, false) => GameStatus::Stalemate,
        (true, true) => GameStatus::Check,
        (false, true) => GameStatus::Ongoing,
    }
}
