pub mod error;
pub mod manager;
pub mod rating;
pub mod session;

pub use error::GameError;
pub use manager::{SessionHandle, SessionManager};
pub use rating::{
    elo_delta, finalize_ratings, Outcome, RatingConfig, DEFAULT_K_FACTOR, DEFAULT_RATING,
};
pub use session::{Finalization, GameSession, MoveOutcome, PlyRecord};
