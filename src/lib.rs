pub mod chess;
pub mod cli;
pub mod crypto;
pub mod game;
pub mod hub;
pub mod matchmaking;
pub mod messages;
pub mod network;
pub mod storage;

// Re-export key types for easy testing
pub use chess::{Position, Square};
pub use crypto::{Identity, ParticipantId};
pub use game::{GameSession, SessionManager};
pub use hub::ConnectionHub;
pub use matchmaking::PairingQueue;
pub use messages::{InboundMessage, OutboundMessage};
pub use network::{Client, Server};
pub use storage::Database;
