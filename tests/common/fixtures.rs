//! Builders for a complete in-memory server stack

use gambit::chess::STARTING_FEN;
use gambit::crypto::{CredentialVerifier, Identity, ParticipantId, SignedCredentialVerifier};
use gambit::game::{GameError, GameSession, RatingConfig, SessionManager};
use gambit::hub::{ConnectionHub, ConnectionId};
use gambit::matchmaking::{PairingQueue, DEFAULT_PAIRING_RETRIES};
use gambit::messages::OutboundMessage;
use gambit::network::Dispatcher;
use gambit::storage::{games, Database};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub fn participant(name: &str) -> ParticipantId {
    ParticipantId::from(name)
}

/// Play `tokens` in order, alternating between the two players from the side to move
pub fn play(session: &mut GameSession, tokens: &[&str]) -> Result<(), GameError> {
    for token in tokens {
        let mover = session
            .participant(session.position().side_to_move())
            .clone();
        session.submit_move(&mover, token)?;
    }
    Ok(())
}

/// Everything queued on a connection's outbound channel so far
pub fn drain(rx: &mut UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

pub struct TestStack {
    pub identity: Identity,
    pub database: Database,
    pub hub: Arc<ConnectionHub>,
    pub sessions: Arc<SessionManager>,
    pub matchmaking: Arc<PairingQueue>,
    pub dispatcher: Arc<Dispatcher>,
}

impl TestStack {
    pub fn new() -> Self {
        Self::with_database(Database::open_in_memory().expect("in-memory database"))
    }

    pub fn with_database(database: Database) -> Self {
        let identity = Identity::generate().expect("identity");
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(SignedCredentialVerifier::for_identity(&identity));
        let hub = Arc::new(ConnectionHub::new(verifier));
        let sessions = Arc::new(SessionManager::new(
            database.clone(),
            Arc::clone(&hub),
            RatingConfig::default(),
        ));
        let matchmaking = Arc::new(PairingQueue::new(
            Arc::clone(&sessions),
            DEFAULT_PAIRING_RETRIES,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&hub),
            Arc::clone(&sessions),
            Arc::clone(&matchmaking),
        ));

        Self {
            identity,
            database,
            hub,
            sessions,
            matchmaking,
            dispatcher,
        }
    }

    pub fn credential(&self, name: &str) -> String {
        self.identity.issue_credential(&participant(name))
    }

    /// Store and register a fresh game between `white` and `black`
    pub fn start_game(&self, game_id: &str, white: &str, black: &str) {
        self.database
            .with_transaction(|conn| games::insert_game(conn, game_id, white, black, STARTING_FEN))
            .expect("insert game");
        self.sessions.register(GameSession::new(
            game_id,
            participant(white),
            participant(black),
        ));
    }

    /// Register a hub connection and authenticate it as `name`
    pub fn connect(&self, name: &str) -> (ConnectionId, UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = self.hub.register(tx);
        self.hub
            .authenticate(connection, &self.credential(name))
            .expect("authenticate");
        (connection, rx)
    }
}

impl Default for TestStack {
    fn default() -> Self {
        Self::new()
    }
}
