use gambit::chess::{resolve, ChessError, PieceType, Position, Square};

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn play(position: Position, tokens: &[&str]) -> Position {
    tokens.iter().fold(position, |position, token| {
        let mv = resolve(&position, token)
            .unwrap_or_else(|e| panic!("'{}' should resolve: {}", token, e));
        position.apply(&mv)
    })
}

#[cfg(test)]
mod resolution_tests {
    use super::*;

    #[test]
    fn test_king_pawn_opening() {
        let position = play(Position::starting(), &["e4"]);
        assert_eq!(
            position.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_coordinate_style_token() {
        let mv = resolve(&Position::starting(), "e2e4").unwrap();
        assert_eq!(mv.from, sq("e2"));
        assert_eq!(mv.to, sq("e4"));
    }

    #[test]
    fn test_knight_ambiguity_and_disambiguation() {
        // Knights on d2 and g1 both reach f3
        let position = Position::from_fen("4k3/8/8/8/8/8/3N4/4K1N1 w - - 0 1").unwrap();

        assert!(matches!(
            resolve(&position, "Nf3"),
            Err(ChessError::AmbiguousMove(_))
        ));
        assert_eq!(resolve(&position, "Ndf3").unwrap().from, sq("d2"));
        assert_eq!(resolve(&position, "Ngf3").unwrap().from, sq("g1"));
        assert_eq!(resolve(&position, "N2f3").unwrap().from, sq("d2"));
        assert_eq!(resolve(&position, "N1f3").unwrap().from, sq("g1"));
        assert_eq!(resolve(&position, "Ng1f3").unwrap().from, sq("g1"));
    }

    #[test]
    fn test_capture_marker_must_match() {
        let position = Position::starting();
        assert!(matches!(
            resolve(&position, "Nxf3"),
            Err(ChessError::IllegalMove(_))
        ));

        let position = play(Position::starting(), &["e4", "d5"]);
        assert!(resolve(&position, "exd5").unwrap().capture);
        assert!(matches!(
            resolve(&position, "d5"),
            Err(ChessError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_decoration_is_ignored() {
        let position = play(Position::starting(), &["f3", "e5", "g4"]);
        let plain = resolve(&position, "Qh4").unwrap();
        assert_eq!(resolve(&position, "Qh4#").unwrap(), plain);
        assert_eq!(resolve(&position, "Qh4+").unwrap(), plain);
    }

    #[test]
    fn test_castling_tokens() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let next = play(position, &["O-O", "O-O-O"]);
        assert_eq!(next.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");

        let no_rights = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
        assert!(matches!(
            resolve(&no_rights, "O-O"),
            Err(ChessError::IllegalMove(_))
        ));
    }
}

#[cfg(test)]
mod promotion_tests {
    use super::*;

    const PROMOTION: &str = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1";

    #[test]
    fn test_missing_suffix_promotes_to_queen() {
        let position = Position::from_fen(PROMOTION).unwrap();
        let next = play(position, &["a8"]);
        assert_eq!(
            next.piece_at(sq("a8")).map(|p| p.piece_type),
            Some(PieceType::Queen)
        );
    }

    #[test]
    fn test_underpromotion() {
        let position = Position::from_fen(PROMOTION).unwrap();
        let mv = resolve(&position, "a8=N").unwrap();
        assert_eq!(mv.promotion, Some(PieceType::Knight));
        assert_eq!(
            position.apply(&mv).piece_at(sq("a8")).map(|p| p.piece_type),
            Some(PieceType::Knight)
        );
    }

    #[test]
    fn test_suffix_off_the_last_rank_is_illegal() {
        assert!(matches!(
            resolve(&Position::starting(), "e4=Q"),
            Err(ChessError::IllegalMove(_))
        ));
    }
}

#[cfg(test)]
mod rejection_tests {
    use super::*;

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "e9", "i4", "Zf3", "e4e", "O-O-O-O", "Nf3=Q"] {
            assert!(
                matches!(
                    resolve(&Position::starting(), token),
                    Err(ChessError::InvalidFormat(_))
                ),
                "'{}' should be rejected as malformed",
                token
            );
        }
    }

    #[test]
    fn test_well_formed_but_illegal() {
        for token in ["e5", "Ke2", "Bc4", "O-O", "Nd4"] {
            assert!(
                matches!(
                    resolve(&Position::starting(), token),
                    Err(ChessError::IllegalMove(_))
                ),
                "'{}' should be illegal from the start",
                token
            );
        }
    }
}
