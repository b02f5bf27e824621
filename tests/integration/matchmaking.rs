use crate::common::{drain, participant, TestStack};
use gambit::chess::Color;
use gambit::matchmaking::{MatchmakingError, Pairing};
use gambit::messages::OutboundMessage;
use gambit::storage::GameState;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn assert_disjoint(pairings: &[Pairing]) {
    let mut seen = HashSet::new();
    for pairing in pairings {
        assert_ne!(pairing.white, pairing.black);
        assert!(seen.insert(pairing.white.clone()), "{} paired twice", pairing.white);
        assert!(seen.insert(pairing.black.clone()), "{} paired twice", pairing.black);
    }
}

#[test]
fn test_concurrent_pairing_claims_each_entry_once() {
    const PLAYERS: usize = 9;

    let stack = TestStack::new();
    for i in 0..PLAYERS {
        stack.matchmaking.enqueue(&participant(&format!("p{}", i))).unwrap();
    }
    assert_eq!(stack.matchmaking.queue_len().unwrap(), PLAYERS);

    let handles: Vec<_> = (0..PLAYERS)
        .map(|_| {
            let queue = Arc::clone(&stack.matchmaking);
            thread::spawn(move || queue.try_pair())
        })
        .collect();

    let mut pairings = Vec::new();
    for handle in handles {
        match handle.join().unwrap() {
            Ok(pairing) => pairings.push(pairing),
            Err(MatchmakingError::QueueContention) => {}
            Err(e) => panic!("unexpected pairing failure: {}", e),
        }
    }

    assert_eq!(pairings.len(), PLAYERS / 2);
    assert_disjoint(&pairings);
    assert_eq!(stack.matchmaking.queue_len().unwrap(), PLAYERS % 2);
    assert_eq!(stack.sessions.session_count(), PLAYERS / 2);
    assert_eq!(
        stack.database.list_active_games().unwrap().len(),
        PLAYERS / 2
    );
}

#[test]
fn test_enqueue_and_pair_race_leaves_at_most_one_waiting() {
    const PLAYERS: usize = 12;

    let stack = TestStack::new();
    let handles: Vec<_> = (0..PLAYERS)
        .map(|i| {
            let queue = Arc::clone(&stack.matchmaking);
            thread::spawn(move || {
                queue.enqueue(&participant(&format!("p{}", i))).unwrap();
                queue.try_pair()
            })
        })
        .collect();

    let pairings: Vec<Pairing> = handles
        .into_iter()
        .filter_map(|handle| handle.join().unwrap().ok())
        .collect();

    assert_eq!(pairings.len(), PLAYERS / 2);
    assert_disjoint(&pairings);
    assert_eq!(stack.matchmaking.queue_len().unwrap(), 0);
}

#[test]
fn test_single_entry_is_not_paired() {
    let stack = TestStack::new();
    stack.matchmaking.enqueue(&participant("alice")).unwrap();

    assert!(matches!(
        stack.matchmaking.try_pair(),
        Err(MatchmakingError::QueueContention)
    ));
    assert_eq!(stack.matchmaking.queue_len().unwrap(), 1);
    assert_eq!(stack.sessions.session_count(), 0);
}

#[test]
fn test_higher_rating_plays_white() {
    let stack = TestStack::new();
    stack
        .matchmaking
        .enqueue_with_rating(&participant("alice"), 1100)
        .unwrap();
    stack
        .matchmaking
        .enqueue_with_rating(&participant("bob"), 1500)
        .unwrap();

    let pairing = stack.matchmaking.try_pair().unwrap();
    assert_eq!(pairing.white, participant("bob"));
    assert_eq!(pairing.black, participant("alice"));

    let game = stack.database.get_game(&pairing.game_id).unwrap();
    assert_eq!(game.white_id, "bob");
    assert_eq!(game.status, GameState::Active);
}

#[test]
fn test_rejoining_moves_to_back_and_cancel_removes() {
    let stack = TestStack::new();
    let queue = &stack.matchmaking;
    assert_eq!(queue.enqueue(&participant("alice")).unwrap(), (1, 1));
    assert_eq!(queue.enqueue(&participant("bob")).unwrap(), (2, 2));
    assert_eq!(queue.enqueue(&participant("alice")).unwrap(), (2, 2));
    assert_eq!(queue.position(&participant("bob")).unwrap(), Some(1));

    assert!(queue.leave(&participant("bob")).unwrap());
    assert!(!queue.leave(&participant("bob")).unwrap());
    assert_eq!(queue.position(&participant("bob")).unwrap(), None);
    assert_eq!(queue.queue_len().unwrap(), 1);
}

#[test]
fn test_pairing_notifies_and_subscribes_both_players() {
    let stack = TestStack::new();
    let (_alice, mut alice_rx) = stack.connect("alice");
    let (_bob, mut bob_rx) = stack.connect("bob");

    stack.matchmaking.enqueue(&participant("alice")).unwrap();
    stack.matchmaking.enqueue(&participant("bob")).unwrap();
    let pairing = stack.matchmaking.try_pair().unwrap();

    assert_eq!(stack.hub.room_size(&pairing.game_id), 2);
    for (rx, expected_color, expected_opponent) in [
        (&mut alice_rx, Color::White, "bob"),
        (&mut bob_rx, Color::Black, "alice"),
    ] {
        match drain(rx).as_slice() {
            [OutboundMessage::MatchFound {
                game_id,
                color,
                opponent,
            }] => {
                assert_eq!(game_id, &pairing.game_id);
                assert_eq!(*color, expected_color);
                assert_eq!(opponent, expected_opponent);
            }
            other => panic!("expected match_found, got {:?}", other),
        }
    }

    let session = stack.sessions.snapshot(&pairing.game_id).unwrap();
    assert_eq!(session.white(), &participant("alice"));
    assert!(session.is_active());
}
