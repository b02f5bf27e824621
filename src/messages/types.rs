//! Inbound and outbound message shapes.
//!
//! Inbound frames are decoded by hand from a JSON object so that an unknown
//! `type` and a missing field each map to their own typed rejection instead of
//! a generic parse failure.

use crate::chess::Color;
use crate::hub::HubError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Every message kind a client may send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Auth { credential: String },
    JoinGame { game_id: String },
    LeaveGame { game_id: String },
    Ping,
    SubmitMove { game_id: String, token: String },
    Resign { game_id: String },
    OfferDraw { game_id: String },
    AcceptDraw { game_id: String },
    FindMatch,
    CancelMatch,
}

impl InboundMessage {
    /// Decode a parsed JSON frame
    pub fn decode(value: &Value) -> Result<Self, HubError> {
        let object = value
            .as_object()
            .ok_or_else(|| HubError::Malformed("expected a JSON object".to_string()))?;

        let kind = object
            .get("type")
            .ok_or_else(|| HubError::MissingField("type".to_string()))?
            .as_str()
            .ok_or_else(|| HubError::Malformed("'type' must be a string".to_string()))?;

        let message = match kind {
            "auth" => InboundMessage::Auth {
                credential: required_str(object, "credential")?,
            },
            "join_game" => InboundMessage::JoinGame {
                game_id: required_str(object, "gameId")?,
            },
            "leave_game" => InboundMessage::LeaveGame {
                game_id: required_str(object, "gameId")?,
            },
            "ping" => InboundMessage::Ping,
            "submit_move" => InboundMessage::SubmitMove {
                game_id: required_str(object, "gameId")?,
                token: required_str(object, "move")?,
            },
            "resign" => InboundMessage::Resign {
                game_id: required_str(object, "gameId")?,
            },
            "offer_draw" => InboundMessage::OfferDraw {
                game_id: required_str(object, "gameId")?,
            },
            "accept_draw" => InboundMessage::AcceptDraw {
                game_id: required_str(object, "gameId")?,
            },
            "find_match" => InboundMessage::FindMatch,
            "cancel_match" => InboundMessage::CancelMatch,
            other => return Err(HubError::UnknownMessageType(other.to_string())),
        };

        Ok(message)
    }

    /// Wire name of this message kind
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Auth { .. } => "auth",
            InboundMessage::JoinGame { .. } => "join_game",
            InboundMessage::LeaveGame { .. } => "leave_game",
            InboundMessage::Ping => "ping",
            InboundMessage::SubmitMove { .. } => "submit_move",
            InboundMessage::Resign { .. } => "resign",
            InboundMessage::OfferDraw { .. } => "offer_draw",
            InboundMessage::AcceptDraw { .. } => "accept_draw",
            InboundMessage::FindMatch => "find_match",
            InboundMessage::CancelMatch => "cancel_match",
        }
    }
}

fn required_str(object: &Map<String, Value>, field: &str) -> Result<String, HubError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(HubError::MissingField(field.to_string())),
        Some(Value::String(s)) if s.is_empty() => Err(HubError::MissingField(field.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(HubError::Malformed(format!("'{field}' must be a string"))),
    }
}

/// Rating movement for one participant at game end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub participant: String,
    pub old_rating: i32,
    pub new_rating: i32,
    pub delta: i32,
}

/// Every message the server pushes to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    Authenticated { participant: String },

    #[serde(rename_all = "camelCase")]
    Joined { game_id: String },

    #[serde(rename_all = "camelCase")]
    Left { game_id: String },

    Pong,

    #[serde(rename_all = "camelCase")]
    GameState {
        game_id: String,
        white: String,
        black: String,
        fen: String,
        side_to_move: Color,
        active: bool,
        moves: Vec<String>,
    },

    #[serde(rename_all = "camelCase")]
    Queued { position: usize, queue_len: usize },

    #[serde(rename_all = "camelCase")]
    MatchCancelled { removed: bool },

    #[serde(rename_all = "camelCase")]
    MatchFound {
        game_id: String,
        color: Color,
        opponent: String,
    },

    #[serde(rename_all = "camelCase")]
    MoveMade {
        game_id: String,
        participant: String,
        ply: u32,
        token: String,
        fen: String,
        hash: String,
        side_to_move: Color,
        check: bool,
    },

    #[serde(rename_all = "camelCase")]
    DrawOffered { game_id: String, by: String },

    #[serde(rename_all = "camelCase")]
    GameOver {
        game_id: String,
        reason: String,
        winner: Option<String>,
        rating_changes: Vec<RatingChange>,
    },

    Error { code: String, message: String },
}

impl OutboundMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        OutboundMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Get the message type as a string
    pub fn message_type(&self) -> &'static str {
        match self {
            OutboundMessage::Authenticated { .. } => "authenticated",
            OutboundMessage::Joined { .. } => "joined",
            OutboundMessage::Left { .. } => "left",
            OutboundMessage::Pong => "pong",
            OutboundMessage::GameState { .. } => "game_state",
            OutboundMessage::Queued { .. } => "queued",
            OutboundMessage::MatchCancelled { .. } => "match_cancelled",
            OutboundMessage::MatchFound { .. } => "match_found",
            OutboundMessage::MoveMade { .. } => "move_made",
            OutboundMessage::DrawOffered { .. } => "draw_offered",
            OutboundMessage::GameOver { .. } => "game_over",
            OutboundMessage::Error { .. } => "error",
        }
    }
}
