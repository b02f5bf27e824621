//! First-come pairing queue.
//!
//! The queue lives in storage; claiming the two oldest entries and inserting the
//! new game row happen in one transaction, so concurrent `try_pair` calls can
//! never hand the same participant to two games.

use crate::chess::{Color, STARTING_FEN};
use crate::crypto::ParticipantId;
use crate::game::{GameSession, SessionManager};
use crate::messages::chess::generate_game_id;
use crate::messages::OutboundMessage;
use crate::storage::{games, players, queue, QueueEntry, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_PAIRING_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum MatchmakingError {
    #[error("Fewer than two players are waiting")]
    QueueContention,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl MatchmakingError {
    pub fn code(&self) -> &'static str {
        match self {
            MatchmakingError::QueueContention => "QUEUE_CONTENTION",
            MatchmakingError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// A freshly created game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub game_id: String,
    pub white: ParticipantId,
    pub black: ParticipantId,
}

pub struct PairingQueue {
    sessions: Arc<SessionManager>,
    max_retries: u32,
}

impl PairingQueue {
    pub fn new(sessions: Arc<SessionManager>, max_retries: u32) -> Self {
        Self {
            sessions,
            max_retries,
        }
    }

    /// Join (or rejoin) the queue with the participant's stored rating.
    ///
    /// Returns the 1-based queue position and the queue length.
    #[instrument(skip(self), fields(participant = %participant))]
    pub fn enqueue(&self, participant: &ParticipantId) -> Result<(usize, usize), MatchmakingError> {
        let default_rating = self.sessions.ratings().default_rating;
        let status = self.sessions.database().with_transaction(|conn| {
            let player = players::ensure_player(conn, participant.as_str(), default_rating)?;
            queue::upsert_entry(conn, participant.as_str(), player.rating)?;
            let position = queue::queue_position(conn, participant.as_str())?.unwrap_or(1);
            Ok((position, queue::queue_len(conn)?))
        })?;
        debug!(position = status.0, queue_len = status.1, "Enqueued");
        Ok(status)
    }

    /// Enqueue with an explicit rating snapshot, bypassing the player table
    pub fn enqueue_with_rating(
        &self,
        participant: &ParticipantId,
        rating: i32,
    ) -> Result<(), MatchmakingError> {
        self.sessions
            .database()
            .with_connection(|conn| queue::upsert_entry(conn, participant.as_str(), rating))?;
        Ok(())
    }

    /// Remove the participant's entry; reports whether one existed
    pub fn leave(&self, participant: &ParticipantId) -> Result<bool, MatchmakingError> {
        Ok(self
            .sessions
            .database()
            .with_connection(|conn| queue::remove_entry(conn, participant.as_str()))?)
    }

    pub fn queue_len(&self) -> Result<usize, MatchmakingError> {
        Ok(self.sessions.database().with_connection(queue::queue_len)?)
    }

    pub fn position(&self, participant: &ParticipantId) -> Result<Option<usize>, MatchmakingError> {
        Ok(self
            .sessions
            .database()
            .with_connection(|conn| queue::queue_position(conn, participant.as_str()))?)
    }

    /// Pair the two oldest entries into a new game and notify both players.
    ///
    /// With fewer than two entries nothing changes and `QueueContention` is
    /// returned. Lock contention in storage is retried immediately, up to the
    /// configured limit; this runs on connection tasks and must not sleep.
    #[instrument(skip(self))]
    pub fn try_pair(&self) -> Result<Pairing, MatchmakingError> {
        let pairing = retry_transient(self.max_retries, || self.claim())?;

        self.sessions.register(GameSession::new(
            pairing.game_id.clone(),
            pairing.white.clone(),
            pairing.black.clone(),
        ));

        let hub = self.sessions.hub();
        for (participant, color, opponent) in [
            (&pairing.white, Color::White, &pairing.black),
            (&pairing.black, Color::Black, &pairing.white),
        ] {
            hub.join_identity(participant, &pairing.game_id);
            hub.notify_identity(
                participant,
                OutboundMessage::MatchFound {
                    game_id: pairing.game_id.clone(),
                    color,
                    opponent: opponent.to_string(),
                },
            );
        }

        info!(
            game_id = %pairing.game_id,
            white = %pairing.white,
            black = %pairing.black,
            "Paired players"
        );
        Ok(pairing)
    }

    /// One indivisible claim: read and delete the two oldest entries, insert the game
    fn claim(&self) -> Result<Pairing, MatchmakingError> {
        let pairing = self.sessions.database().with_transaction(|conn| {
            let mut claimed = queue::claim_oldest_pair(conn)?.into_iter();
            let (Some(first), Some(second)) = (claimed.next(), claimed.next()) else {
                return Ok(None);
            };
            let pairing = assign_colors(generate_game_id(), first, second);
            games::insert_game(
                conn,
                &pairing.game_id,
                pairing.white.as_str(),
                pairing.black.as_str(),
                STARTING_FEN,
            )?;
            Ok(Some(pairing))
        });

        match pairing {
            Ok(Some(pairing)) => Ok(pairing),
            Ok(None) => Err(MatchmakingError::QueueContention),
            Err(e) => Err(e.into()),
        }
    }
}

/// Run `claim` again while it fails with a transient storage error, at most
/// `max_retries` extra times. A rolled-back claim leaves the queue untouched.
fn retry_transient<T>(
    max_retries: u32,
    mut claim: impl FnMut() -> Result<T, MatchmakingError>,
) -> Result<T, MatchmakingError> {
    let mut attempt = 0;
    loop {
        match claim() {
            Err(MatchmakingError::Storage(e)) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                warn!(attempt, error = %e, "Transient storage failure while pairing, retrying");
            }
            other => return other,
        }
    }
}

/// Higher rating plays white; on a tie the entry read first does
fn assign_colors(game_id: String, first: QueueEntry, second: QueueEntry) -> Pairing {
    let (white, black) = if second.rating > first.rating {
        (second, first)
    } else {
        (first, second)
    };
    Pairing {
        game_id,
        white: ParticipantId::new(white.participant_id),
        black: ParticipantId::new(black.participant_id),
    }
}
