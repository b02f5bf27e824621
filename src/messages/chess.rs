use crate::chess::Position;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a unique game identifier
///
/// Game identifiers double as hub room names, so every session created by
/// pairing gets a fresh UUID v4.
///
/// # Examples
///
/// ```
/// use gambit::messages::chess::generate_game_id;
///
/// let game_id = generate_game_id();
/// assert_eq!(game_id.len(), 36); // Standard UUID string length
/// ```
pub fn generate_game_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validate that a string is a properly formatted UUID game ID
///
/// # Examples
///
/// ```
/// use gambit::messages::chess::{generate_game_id, validate_game_id};
///
/// assert!(validate_game_id(&generate_game_id()));
/// assert!(!validate_game_id("not-a-uuid"));
/// ```
pub fn validate_game_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Generate a SHA-256 hash of a position
///
/// The position text is the canonical representation, so identical positions
/// always produce identical hashes. Clients compare the hash carried in
/// `moveMade` events against their own view to detect desynchronization.
///
/// # Examples
///
/// ```
/// use gambit::chess::Position;
/// use gambit::messages::chess::hash_position;
///
/// let hash = hash_position(&Position::starting());
/// assert_eq!(hash.len(), 64); // SHA-256 produces 64-character hex strings
/// ```
pub fn hash_position(position: &Position) -> String {
    hash_fen(&position.to_fen())
}

/// Hash already-serialized position text
pub fn hash_fen(fen: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fen.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify that a position matches the expected hash (case-insensitive hex)
pub fn verify_position_hash(position: &Position, expected_hash: &str) -> bool {
    hash_position(position).eq_ignore_ascii_case(expected_hash)
}
