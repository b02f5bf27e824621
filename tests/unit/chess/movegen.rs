use gambit::chess::{
    is_attacked, is_in_check, legal_moves, pseudo_legal_moves, status, CastleSide, Color,
    GameStatus, Position, Square,
};

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    legal_moves(position)
        .iter()
        .map(|mv| perft(&position.apply(mv), depth - 1))
        .sum()
}

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ROOK_ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

#[cfg(test)]
mod move_count_tests {
    use super::*;

    #[test]
    fn test_starting_position_counts() {
        let start = Position::starting();
        assert_eq!(perft(&start, 1), 20);
        assert_eq!(perft(&start, 2), 400);
        assert_eq!(perft(&start, 3), 8902);
    }

    #[test]
    fn test_castling_heavy_position_counts() {
        let position = Position::from_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&position, 1), 48);
        assert_eq!(perft(&position, 2), 2039);
    }

    #[test]
    fn test_en_passant_pin_position_counts() {
        let position = Position::from_fen(ROOK_ENDGAME).unwrap();
        assert_eq!(perft(&position, 1), 14);
        assert_eq!(perft(&position, 2), 191);
        assert_eq!(perft(&position, 3), 2812);
    }
}

#[cfg(test)]
mod legality_tests {
    use super::*;

    /// No legal move may leave the mover's own king attacked
    fn assert_closed(position: &Position) {
        let mover = position.side_to_move();
        for mv in legal_moves(position) {
            let next = position.apply(&mv);
            assert!(
                !is_in_check(&next, mover),
                "{} leaves {} in check from {}",
                mv,
                mover,
                position.to_fen()
            );
            assert_eq!(next.side_to_move(), mover.opposite());
        }
    }

    #[test]
    fn test_legal_moves_never_expose_own_king() {
        let fens = [
            KIWIPETE,
            ROOK_ENDGAME,
            // Pinned knight on e2
            "4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1",
            // Double check: only king moves
            "4k3/8/8/8/1b6/3n4/8/4K3 w - - 0 1",
        ];
        for fen in fens {
            let position = Position::from_fen(fen).unwrap();
            assert_closed(&position);
            for mv in legal_moves(&position) {
                assert_closed(&position.apply(&mv));
            }
        }
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let position = Position::from_fen("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(!pseudo_legal_moves(&position, sq("e2")).is_empty());
        assert!(legal_moves(&position).iter().all(|mv| mv.from != sq("e2")));
    }

    #[test]
    fn test_double_check_allows_only_king_moves() {
        let position = Position::from_fen("4k3/8/8/8/1b6/3n4/8/4K3 w - - 0 1").unwrap();
        assert!(is_in_check(&position, Color::White));
        let moves = legal_moves(&position);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|mv| mv.from == sq("e1")));
    }

    #[test]
    fn test_attack_detection() {
        let position = Position::starting();
        assert!(is_attacked(&position, sq("f3"), Color::White));
        assert!(is_attacked(&position, sq("d6"), Color::Black));
        assert!(!is_attacked(&position, sq("e4"), Color::White));
        assert!(!is_in_check(&position, Color::White));
    }
}

#[cfg(test)]
mod special_move_tests {
    use super::*;

    #[test]
    fn test_castling_through_attack_is_illegal() {
        // Black bishop on a6 covers f1
        let position = Position::from_fen("4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let castles: Vec<CastleSide> = legal_moves(&position)
            .iter()
            .filter_map(|mv| mv.castle)
            .collect();
        assert_eq!(castles, vec![CastleSide::Queen]);
    }

    #[test]
    fn test_castling_requires_rook_and_empty_path() {
        let no_rook = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KQ - 0 1").unwrap();
        assert!(legal_moves(&no_rook).iter().all(|mv| !mv.is_castling()));

        let blocked = Position::from_fen("4k3/8/8/8/8/8/8/RN2K1NR w KQ - 0 1").unwrap();
        assert!(legal_moves(&blocked).iter().all(|mv| !mv.is_castling()));
    }

    #[test]
    fn test_castling_moves_rook_and_clears_rights() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castle = legal_moves(&position)
            .into_iter()
            .find(|mv| mv.castle == Some(CastleSide::King))
            .expect("kingside castle available");
        let next = position.apply(&castle);
        assert_eq!(next.to_fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");
    }

    #[test]
    fn test_en_passant_capture_removes_pawn() {
        let position =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let capture = legal_moves(&position)
            .into_iter()
            .find(|mv| mv.en_passant)
            .expect("en passant available");
        assert_eq!(capture.to, sq("f6"));

        let next = position.apply(&capture);
        assert_eq!(next.piece_at(sq("f5")), None);
        assert_eq!(
            next.to_fen(),
            "rnbqkbnr/ppp1p1pp/5P2/3p4/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3"
        );
    }

    #[test]
    fn test_en_passant_target_only_after_double_push() {
        let start = Position::starting();
        let double = legal_moves(&start)
            .into_iter()
            .find(|mv| mv.from == sq("e2") && mv.to == sq("e4"))
            .unwrap();
        assert_eq!(start.apply(&double).en_passant_target(), Some(sq("e3")));

        let single = legal_moves(&start)
            .into_iter()
            .find(|mv| mv.from == sq("e2") && mv.to == sq("e3"))
            .unwrap();
        assert_eq!(start.apply(&single).en_passant_target(), None);
    }
}

#[cfg(test)]
mod status_tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(status(&Position::starting()), GameStatus::Ongoing);

        // Fool's mate
        let mate =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert_eq!(status(&mate), GameStatus::Checkmate);
        assert!(status(&mate).is_terminal());

        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(status(&stalemate), GameStatus::Stalemate);
        assert!(status(&stalemate).is_terminal());

        let check = Position::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
        assert_eq!(status(&check), GameStatus::Check);
        assert!(!status(&check).is_terminal());
    }
}
