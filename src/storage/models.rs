use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Active,
    Finished,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Active => "active",
            GameState::Finished => "finished",
        }
    }
}

impl FromStr for GameState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GameState::Active),
            "finished" => Ok(GameState::Finished),
            other => Err(format!("Invalid game state '{other}' (valid: active, finished)")),
        }
    }
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Stalemate,
    Resignation,
    DrawAgreement,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::Resignation => "resignation",
            Termination::DrawAgreement => "draw_agreement",
        }
    }
}

impl FromStr for Termination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkmate" => Ok(Termination::Checkmate),
            "stalemate" => Ok(Termination::Stalemate),
            "resignation" => Ok(Termination::Resignation),
            "draw_agreement" => Ok(Termination::DrawAgreement),
            other => Err(format!(
                "Invalid termination '{other}' (valid: checkmate, stalemate, resignation, draw_agreement)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub participant_id: String,
    pub rating: i32,
    pub games_played: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub white_id: String,
    pub black_id: String,
    pub status: GameState,
    pub result: Option<Termination>,
    pub winner_id: Option<String>,
    pub current_fen: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub finished_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub game_id: String,
    pub ply: u32,
    pub participant_id: String,
    pub token: String,
    pub fen_after: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub participant_id: String,
    pub rating: i32,
    pub enqueued_at: i64,
    pub seq: i64,
}
