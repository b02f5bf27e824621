//! Live sessions and the serialized commit path that mutates them.
//!
//! Each session sits behind its own mutex. A mutation clones the session,
//! applies the change to the clone, persists it in one storage transaction and
//! only then swaps the clone in and publishes its events, so a failed write never
//! leaves a half-applied game in memory. Locking one session never blocks another.

use super::rating::{finalize_ratings, Outcome, RatingConfig};
use super::session::{Finalization, GameSession, MoveOutcome};
use super::GameError;
use crate::chess::{self, Color};
use crate::crypto::ParticipantId;
use crate::hub::ConnectionHub;
use crate::messages::chess::hash_fen;
use crate::messages::{OutboundMessage, RatingChange};
use crate::storage::{games, players, Database, StorageError};
use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub type SessionHandle = Arc<Mutex<GameSession>>;

pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    database: Database,
    hub: Arc<ConnectionHub>,
    ratings: RatingConfig,
}

impl SessionManager {
    pub fn new(database: Database, hub: Arc<ConnectionHub>, ratings: RatingConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            database,
            hub,
            ratings,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn ratings(&self) -> RatingConfig {
        self.ratings
    }

    /// Rebuild every active game from storage by replaying its move history.
    ///
    /// Games whose history no longer replays are logged and skipped.
    pub fn restore(&self) -> Result<usize, GameError> {
        let stored = self.database.list_active_games()?;
        let mut restored = 0;

        for game in stored {
            let moves = self.database.get_moves(&game.id)?;
            let replayed = GameSession::replay(
                game.id.clone(),
                ParticipantId::new(game.white_id.clone()),
                ParticipantId::new(game.black_id.clone()),
                &moves,
            );

            match replayed {
                Ok(session) if session.is_active() => {
                    if session.position().to_fen() != game.current_fen {
                        warn!(game_id = %game.id, "Stored position differs from replayed history; using replay");
                    }
                    self.register(session);
                    restored += 1;
                }
                Ok(_) => warn!(game_id = %game.id, "Stored active game replays to a finished position"),
                Err(e) => error!(game_id = %game.id, error = %e, "Failed to replay stored game"),
            }
        }

        info!("Restored {} active games", restored);
        Ok(restored)
    }

    /// Track a session whose game row already exists in storage
    pub fn register(&self, session: GameSession) -> SessionHandle {
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().insert(id, handle.clone());
        handle
    }

    pub fn get(&self, game_id: &str) -> Result<SessionHandle, GameError> {
        self.sessions
            .read()
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::SessionNotFound(game_id.to_string()))
    }

    /// Point-in-time copy of a session
    pub fn snapshot(&self, game_id: &str) -> Result<GameSession, GameError> {
        Ok(self.get(game_id)?.lock().clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    #[instrument(skip(self, participant), fields(participant = %participant))]
    pub fn submit_move(
        &self,
        game_id: &str,
        participant: &ParticipantId,
        token: &str,
    ) -> Result<MoveOutcome, GameError> {
        let outcome = self.commit(game_id, |session, _| session.submit_move(participant, token))?;
        debug!(ply = outcome.ply, "Move committed");
        Ok(outcome)
    }

    #[instrument(skip(self, participant), fields(participant = %participant))]
    pub fn resign(&self, game_id: &str, participant: &ParticipantId) -> Result<(), GameError> {
        self.commit(game_id, |session, _| session.resign(participant))
    }

    #[instrument(skip(self))]
    pub fn agree_draw(&self, game_id: &str) -> Result<(), GameError> {
        self.commit(game_id, |session, _| session.agree_draw())
    }

    #[instrument(skip(self, participant), fields(participant = %participant))]
    pub fn offer_draw(&self, game_id: &str, participant: &ParticipantId) -> Result<(), GameError> {
        self.commit(game_id, |session, events| {
            session.offer_draw(participant)?;
            events.push(OutboundMessage::DrawOffered {
                game_id: game_id.to_string(),
                by: participant.to_string(),
            });
            Ok(())
        })
    }

    #[instrument(skip(self, participant), fields(participant = %participant))]
    pub fn accept_draw(&self, game_id: &str, participant: &ParticipantId) -> Result<(), GameError> {
        self.commit(game_id, |session, _| session.accept_draw(participant))
    }

    /// Validate, apply, persist, swap in and publish one mutation, all while
    /// holding the session lock so the room sees events in commit order.
    /// `op` may queue its own events ahead of the move and result events.
    fn commit<T>(
        &self,
        game_id: &str,
        op: impl FnOnce(&mut GameSession, &mut Vec<OutboundMessage>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let handle = self.get(game_id)?;
        let mut guard = handle.lock();

        let mut next = guard.clone();
        let committed_plies = next.history().len();
        let mut events = Vec::new();
        let value = op(&mut next, &mut events)?;
        let finalization = next.take_finalization();

        events.extend(move_events(&next, committed_plies));
        let new_plies = next.history().len() > committed_plies;

        if new_plies || finalization.is_some() {
            let rating_changes = self
                .database
                .with_transaction(|conn| {
                    persist_plies(conn, &next, committed_plies)?;
                    match &finalization {
                        Some(f) => self.finalize(conn, game_id, f).map(Some),
                        None => Ok(None),
                    }
                })
                .map_err(|e| {
                    error!(game_id, error = %e, "Failed to persist game update");
                    e
                })?;

            if let (Some(f), Some(changes)) = (&finalization, rating_changes) {
                info!(game_id, termination = f.termination.as_str(), "Game finished");
                events.push(OutboundMessage::GameOver {
                    game_id: game_id.to_string(),
                    reason: f.termination.as_str().to_string(),
                    winner: next.winner().map(ToString::to_string),
                    rating_changes: changes,
                });
            }
        }

        *guard = next;
        self.publish(game_id, events);
        Ok(value)
    }

    /// Rating and result rows for a finished game, inside the commit transaction
    fn finalize(
        &self,
        conn: &Connection,
        game_id: &str,
        finalization: &Finalization,
    ) -> Result<Vec<RatingChange>, StorageError> {
        let default = self.ratings.default_rating;
        let white = players::ensure_player(conn, finalization.white.as_str(), default)?;
        let black = players::ensure_player(conn, finalization.black.as_str(), default)?;

        let white_outcome = match finalization.winner {
            Some(Color::White) => Outcome::Win,
            Some(Color::Black) => Outcome::Loss,
            None => Outcome::Draw,
        };
        let (white_new, black_new) = finalize_ratings(
            white.rating,
            black.rating,
            white_outcome,
            self.ratings.k_factor,
        );

        players::record_result(conn, &white.participant_id, white_new)?;
        players::record_result(conn, &black.participant_id, black_new)?;

        let winner_id = finalization
            .winner
            .map(|color| match color {
                Color::White => finalization.white.as_str(),
                Color::Black => finalization.black.as_str(),
            });
        games::finish_game(conn, game_id, finalization.termination, winner_id)?;

        Ok(vec![
            RatingChange {
                participant: white.participant_id,
                old_rating: white.rating,
                new_rating: white_new,
                delta: white_new - white.rating,
            },
            RatingChange {
                participant: black.participant_id,
                old_rating: black.rating,
                new_rating: black_new,
                delta: black_new - black.rating,
            },
        ])
    }

    fn publish(&self, game_id: &str, events: Vec<OutboundMessage>) {
        for event in events {
            self.hub.broadcast_room(game_id, event);
        }
    }
}

fn persist_plies(
    conn: &Connection,
    session: &GameSession,
    committed_plies: usize,
) -> Result<(), StorageError> {
    for (index, ply) in session.history().iter().enumerate().skip(committed_plies) {
        games::append_move(
            conn,
            session.id(),
            index as u32 + 1,
            ply.participant.as_str(),
            &ply.token,
            &ply.position.to_fen(),
        )?;
    }
    Ok(())
}

fn move_events(session: &GameSession, committed_plies: usize) -> Vec<OutboundMessage> {
    session
        .history()
        .iter()
        .enumerate()
        .skip(committed_plies)
        .map(|(index, ply)| {
            let fen = ply.position.to_fen();
            let side_to_move = ply.position.side_to_move();
            OutboundMessage::MoveMade {
                game_id: session.id().to_string(),
                participant: ply.participant.to_string(),
                ply: index as u32 + 1,
                token: ply.token.clone(),
                hash: hash_fen(&fen),
                fen,
                side_to_move,
                check: chess::is_in_check(&ply.position, side_to_move),
            }
        })
        .collect()
}
