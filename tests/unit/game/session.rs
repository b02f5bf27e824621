use crate::common::{participant, play};
use gambit::chess::{Color, Position};
use gambit::game::{GameError, GameSession};
use gambit::storage::{GameState, MoveRecord, Termination};

fn session() -> GameSession {
    GameSession::new("g1", participant("alice"), participant("bob"))
}

#[cfg(test)]
mod move_tests {
    use super::*;

    #[test]
    fn test_opening_move_updates_position() {
        let mut game = session();
        let outcome = game.submit_move(&participant("alice"), "e4").unwrap();

        assert_eq!(outcome.ply, 1);
        assert_eq!(
            game.position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.history()[0].token, "e4");
        assert!(game.is_active());
    }

    #[test]
    fn test_turn_violation_leaves_position_unchanged() {
        let mut game = session();
        let before = *game.position();

        let err = game.submit_move(&participant("bob"), "e5").unwrap_err();
        assert!(matches!(err, GameError::TurnViolation(_)));
        assert_eq!(err.code(), "TURN_VIOLATION");
        assert_eq!(*game.position(), before);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_rejections_leave_session_untouched() {
        let mut game = session();
        play(&mut game, &["e4"]).unwrap();
        let before = *game.position();

        let outsider = game.submit_move(&participant("mallory"), "e5").unwrap_err();
        assert!(matches!(outsider, GameError::NotAParticipant { .. }));

        let illegal = game.submit_move(&participant("bob"), "e4").unwrap_err();
        assert!(matches!(illegal, GameError::IllegalMove(_)));

        let malformed = game.submit_move(&participant("bob"), "zz").unwrap_err();
        assert!(matches!(malformed, GameError::InvalidFormat(_)));

        assert_eq!(*game.position(), before);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_checkmate_finishes_game() {
        let mut game = session();
        play(&mut game, &["f3", "e5", "g4", "Qh4"]).unwrap();

        assert_eq!(game.state(), GameState::Finished);
        assert_eq!(game.termination(), Some(Termination::Checkmate));
        assert_eq!(game.winner(), Some(&participant("bob")));

        let err = game.submit_move(&participant("alice"), "a3").unwrap_err();
        assert!(matches!(err, GameError::GameNotActive(_)));
    }

    #[test]
    fn test_stalemate_finishes_without_winner() {
        // Shortest known stalemate
        let mut game = session();
        play(
            &mut game,
            &[
                "e3", "a5", "Qh5", "Ra6", "Qxa5", "h5", "h4", "Rah6", "Qxc7", "f6", "Qxd7",
                "Kf7", "Qxb7", "Qd3", "Qxb8", "Qh7", "Qxc8", "Kg6", "Qe6",
            ],
        )
        .unwrap();

        assert_eq!(game.termination(), Some(Termination::Stalemate));
        assert_eq!(game.winner(), None);
        assert!(!game.is_active());
    }
}

#[cfg(test)]
mod ending_tests {
    use super::*;

    #[test]
    fn test_resignation_awards_opponent() {
        let mut game = session();
        game.resign(&participant("bob")).unwrap();
        assert_eq!(game.termination(), Some(Termination::Resignation));
        assert_eq!(game.winner(), Some(&participant("alice")));

        assert!(matches!(
            game.resign(&participant("alice")),
            Err(GameError::GameNotActive(_))
        ));
    }

    #[test]
    fn test_draw_offer_flow() {
        let mut game = session();

        assert!(matches!(
            game.accept_draw(&participant("bob")),
            Err(GameError::NoDrawOffer(_))
        ));

        game.offer_draw(&participant("alice")).unwrap();
        assert_eq!(game.draw_offer(), Some(&participant("alice")));

        // Accepting your own offer is not possible
        assert!(matches!(
            game.accept_draw(&participant("alice")),
            Err(GameError::NoDrawOffer(_))
        ));

        game.accept_draw(&participant("bob")).unwrap();
        assert_eq!(game.termination(), Some(Termination::DrawAgreement));
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_move_clears_draw_offer() {
        let mut game = session();
        game.offer_draw(&participant("bob")).unwrap();
        play(&mut game, &["d4"]).unwrap();
        assert_eq!(game.draw_offer(), None);
        assert!(matches!(
            game.accept_draw(&participant("alice")),
            Err(GameError::NoDrawOffer(_))
        ));
    }

    #[test]
    fn test_finalization_is_handed_out_once() {
        let mut game = session();
        assert!(game.take_finalization().is_none());

        play(&mut game, &["f3", "e5", "g4", "Qh4#"]).unwrap();
        let finalization = game.take_finalization().expect("finished game finalizes");
        assert_eq!(finalization.winner, Some(Color::Black));
        assert_eq!(finalization.termination, Termination::Checkmate);
        assert_eq!(finalization.white, participant("alice"));

        assert!(game.take_finalization().is_none());
    }
}

#[cfg(test)]
mod replay_tests {
    use super::*;

    fn record(ply: u32, who: &str, token: &str) -> MoveRecord {
        MoveRecord {
            game_id: "g1".to_string(),
            ply,
            participant_id: who.to_string(),
            token: token.to_string(),
            fen_after: String::new(),
            created_at: 0,
        }
    }

    #[test]
    fn test_replay_reaches_same_position() {
        let mut live = session();
        play(&mut live, &["e4", "c5", "Nf3", "d6"]).unwrap();

        let stored = [
            record(1, "alice", "e4"),
            record(2, "bob", "c5"),
            record(3, "alice", "Nf3"),
            record(4, "bob", "d6"),
        ];
        let replayed =
            GameSession::replay("g1", participant("alice"), participant("bob"), &stored).unwrap();

        assert_eq!(replayed.position(), live.position());
        assert_eq!(replayed.history().len(), 4);
        assert_ne!(*replayed.position(), Position::starting());
    }

    #[test]
    fn test_replay_rejects_corrupt_history() {
        let stored = [record(1, "alice", "e4"), record(2, "alice", "d4")];
        assert!(matches!(
            GameSession::replay("g1", participant("alice"), participant("bob"), &stored),
            Err(GameError::TurnViolation(_))
        ));
    }
}
