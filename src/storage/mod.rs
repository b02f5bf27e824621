pub mod database;
pub mod errors;
pub mod games;
pub mod models;
pub mod players;
pub mod queue;
pub mod schema;

// Re-export key types for easy access
pub use database::Database;
pub use errors::StorageError;
pub use models::{GameRecord, GameState, MoveRecord, PlayerRecord, QueueEntry, Termination};

// Re-export commonly used functions
pub use database::get_database_path;
