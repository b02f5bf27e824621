//! Elo rating updates applied once when a game finishes.

use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i32 = 1200;
pub const DEFAULT_K_FACTOR: u32 = 32;

/// Score from one side's point of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn score(&self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingConfig {
    pub default_rating: i32,
    pub k_factor: u32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            default_rating: DEFAULT_RATING,
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}

/// Rating change for the player rated `rating_self` scoring `score` against
/// `rating_opponent`.
pub fn elo_delta(rating_self: i32, rating_opponent: i32, score: f64, k: u32) -> i32 {
    let exponent = f64::from(rating_opponent - rating_self) / 400.0;
    let expected = 1.0 / (1.0 + 10f64.powf(exponent));
    (f64::from(k) * (score - expected)).round() as i32
}

/// Both new ratings after a game. The second player's delta is exactly the
/// negation of the first's; results are clamped at zero.
pub fn finalize_ratings(
    first: i32,
    second: i32,
    first_outcome: Outcome,
    k: u32,
) -> (i32, i32) {
    let delta = elo_delta(first, second, first_outcome.score(), k);
    ((first + delta).max(0), (second - delta).max(0))
}
