//! Routes decoded inbound messages to the hub, the session manager and the
//! pairing queue. Every failure becomes an `error` reply on the same connection.

use crate::crypto::ParticipantId;
use crate::game::{GameError, SessionManager};
use crate::hub::{ConnectionHub, ConnectionId, HubError};
use crate::matchmaking::{MatchmakingError, PairingQueue};
use crate::messages::{InboundMessage, OutboundMessage};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Matchmaking(#[from] MatchmakingError),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Hub(e) => e.code(),
            DispatchError::Game(e) => e.code(),
            DispatchError::Matchmaking(e) => e.code(),
        }
    }

    pub fn to_message(&self) -> OutboundMessage {
        OutboundMessage::error(self.code(), self.to_string())
    }
}

pub struct Dispatcher {
    hub: Arc<ConnectionHub>,
    sessions: Arc<SessionManager>,
    matchmaking: Arc<PairingQueue>,
}

impl Dispatcher {
    pub fn new(
        hub: Arc<ConnectionHub>,
        sessions: Arc<SessionManager>,
        matchmaking: Arc<PairingQueue>,
    ) -> Self {
        Self {
            hub,
            sessions,
            matchmaking,
        }
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Handle one message, replying with an error frame on failure
    pub fn dispatch(&self, connection: ConnectionId, message: InboundMessage) {
        let kind = message.kind();
        debug!(connection, kind, "Dispatching message");

        if let Err(e) = self.handle(connection, message) {
            warn!(connection, kind, code = e.code(), error = %e, "Request rejected");
            self.reply(connection, e.to_message());
        }
    }

    fn reply(&self, connection: ConnectionId, message: OutboundMessage) {
        self.hub.send_to(connection, message);
    }

    /// The caller's identity, after subscribing the connection to the game room
    fn player_in(
        &self,
        connection: ConnectionId,
        game_id: &str,
    ) -> Result<ParticipantId, DispatchError> {
        let participant = self.hub.require_identity(connection)?;
        self.hub.join(connection, game_id)?;
        Ok(participant)
    }

    fn handle(&self, connection: ConnectionId, message: InboundMessage) -> Result<(), DispatchError> {
        match message {
            InboundMessage::Auth { credential } => {
                let participant = self.hub.authenticate(connection, &credential)?;
                self.reply(
                    connection,
                    OutboundMessage::Authenticated {
                        participant: participant.to_string(),
                    },
                );
            }
            InboundMessage::JoinGame { game_id } => {
                self.hub.join(connection, &game_id)?;
                self.reply(
                    connection,
                    OutboundMessage::Joined {
                        game_id: game_id.clone(),
                    },
                );
                if let Ok(session) = self.sessions.snapshot(&game_id) {
                    self.reply(
                        connection,
                        OutboundMessage::GameState {
                            game_id,
                            white: session.white().to_string(),
                            black: session.black().to_string(),
                            fen: session.position().to_fen(),
                            side_to_move: session.position().side_to_move(),
                            active: session.is_active(),
                            moves: session.history().iter().map(|p| p.token.clone()).collect(),
                        },
                    );
                }
            }
            InboundMessage::LeaveGame { game_id } => {
                self.hub.leave(connection, &game_id)?;
                self.reply(connection, OutboundMessage::Left { game_id });
            }
            InboundMessage::Ping => self.reply(connection, OutboundMessage::Pong),
            InboundMessage::SubmitMove { game_id, token } => {
                let participant = self.player_in(connection, &game_id)?;
                self.sessions.submit_move(&game_id, &participant, &token)?;
            }
            InboundMessage::Resign { game_id } => {
                let participant = self.player_in(connection, &game_id)?;
                self.sessions.resign(&game_id, &participant)?;
            }
            InboundMessage::OfferDraw { game_id } => {
                let participant = self.player_in(connection, &game_id)?;
                self.sessions.offer_draw(&game_id, &participant)?;
            }
            InboundMessage::AcceptDraw { game_id } => {
                let participant = self.player_in(connection, &game_id)?;
                self.sessions.accept_draw(&game_id, &participant)?;
            }
            InboundMessage::FindMatch => {
                let participant = self.hub.require_identity(connection)?;
                let (position, queue_len) = self.matchmaking.enqueue(&participant)?;
                self.reply(
                    connection,
                    OutboundMessage::Queued {
                        position,
                        queue_len,
                    },
                );
                match self.matchmaking.try_pair() {
                    Ok(_) | Err(MatchmakingError::QueueContention) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            InboundMessage::CancelMatch => {
                let participant = self.hub.require_identity(connection)?;
                let removed = self.matchmaking.leave(&participant)?;
                self.reply(connection, OutboundMessage::MatchCancelled { removed });
            }
        }
        Ok(())
    }
}
