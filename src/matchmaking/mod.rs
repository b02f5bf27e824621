mod queue;

pub use queue::{MatchmakingError, Pairing, PairingQueue, DEFAULT_PAIRING_RETRIES};
