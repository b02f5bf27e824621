//! One game's state machine: `Active` until checkmate, stalemate, resignation
//! or an agreed draw, then `Finished` for good.

use super::GameError;
use crate::chess::{self, Color, GameStatus, Move, Position};
use crate::crypto::ParticipantId;
use crate::storage::{GameState, MoveRecord, Termination};

/// One committed ply
#[derive(Debug, Clone, PartialEq)]
pub struct PlyRecord {
    pub participant: ParticipantId,
    pub token: String,
    pub position: Position,
}

/// What a successful `submit_move` produced
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub ply: u32,
    pub mv: Move,
    pub position: Position,
    pub status: GameStatus,
}

/// Everything rating finalization needs, handed out exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct Finalization {
    pub white: ParticipantId,
    pub black: ParticipantId,
    pub winner: Option<Color>,
    pub termination: Termination,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: String,
    white: ParticipantId,
    black: ParticipantId,
    state: GameState,
    history: Vec<PlyRecord>,
    position: Position,
    winner: Option<ParticipantId>,
    termination: Option<Termination>,
    draw_offer: Option<ParticipantId>,
    finalization_taken: bool,
}

impl GameSession {
    /// A fresh active game from the starting position
    pub fn new(id: impl Into<String>, white: ParticipantId, black: ParticipantId) -> Self {
        Self {
            id: id.into(),
            white,
            black,
            state: GameState::Active,
            history: Vec::new(),
            position: Position::starting(),
            winner: None,
            termination: None,
            draw_offer: None,
            finalization_taken: false,
        }
    }

    /// Rebuild a session by replaying a stored move history
    pub fn replay(
        id: impl Into<String>,
        white: ParticipantId,
        black: ParticipantId,
        moves: &[MoveRecord],
    ) -> Result<Self, GameError> {
        let mut session = Self::new(id, white, black);
        for record in moves {
            session.submit_move(&ParticipantId::from(record.participant_id.as_str()), &record.token)?;
        }
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn white(&self) -> &ParticipantId {
        &self.white
    }

    pub fn black(&self) -> &ParticipantId {
        &self.black
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == GameState::Active
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &[PlyRecord] {
        &self.history
    }

    pub fn winner(&self) -> Option<&ParticipantId> {
        self.winner.as_ref()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn draw_offer(&self) -> Option<&ParticipantId> {
        self.draw_offer.as_ref()
    }

    pub fn participant(&self, color: Color) -> &ParticipantId {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn color_of(&self, participant: &ParticipantId) -> Option<Color> {
        if *participant == self.white {
            Some(Color::White)
        } else if *participant == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(GameError::GameNotActive(self.id.clone()))
        }
    }

    fn color_of_player(&self, participant: &ParticipantId) -> Result<Color, GameError> {
        self.color_of(participant)
            .ok_or_else(|| GameError::NotAParticipant {
                game_id: self.id.clone(),
                participant: participant.to_string(),
            })
    }

    /// Resolve and apply `token` for `participant`.
    ///
    /// Every rejection leaves the session untouched.
    pub fn submit_move(
        &mut self,
        participant: &ParticipantId,
        token: &str,
    ) -> Result<MoveOutcome, GameError> {
        self.ensure_active()?;
        let color = self.color_of_player(participant)?;
        let to_move = self.position.side_to_move();
        if color != to_move {
            return Err(GameError::TurnViolation(to_move.to_string()));
        }

        let mv = chess::resolve(&self.position, token)?;
        let position = self.position.apply(&mv);
        let status = chess::status(&position);

        self.history.push(PlyRecord {
            participant: participant.clone(),
            token: token.to_string(),
            position,
        });
        self.position = position;
        self.draw_offer = None;

        match status {
            GameStatus::Checkmate => self.finish(Termination::Checkmate, Some(color)),
            GameStatus::Stalemate => self.finish(Termination::Stalemate, None),
            GameStatus::Check | GameStatus::Ongoing => {}
        }

        Ok(MoveOutcome {
            ply: self.history.len() as u32,
            mv,
            position,
            status,
        })
    }

    /// The resigning participant loses
    pub fn resign(&mut self, participant: &ParticipantId) -> Result<(), GameError> {
        self.ensure_active()?;
        let color = self.color_of_player(participant)?;
        self.finish(Termination::Resignation, Some(color.opposite()));
        Ok(())
    }

    /// End the game drawn by mutual agreement
    pub fn agree_draw(&mut self) -> Result<(), GameError> {
        self.ensure_active()?;
        self.finish(Termination::DrawAgreement, None);
        Ok(())
    }

    /// Record a draw offer; a newer offer replaces an older one
    pub fn offer_draw(&mut self, participant: &ParticipantId) -> Result<(), GameError> {
        self.ensure_active()?;
        self.color_of_player(participant)?;
        self.draw_offer = Some(participant.clone());
        Ok(())
    }

    /// Accept the opponent's pending offer
    pub fn accept_draw(&mut self, participant: &ParticipantId) -> Result<(), GameError> {
        self.ensure_active()?;
        self.color_of_player(participant)?;
        match &self.draw_offer {
            Some(offerer) if offerer != participant => self.agree_draw(),
            _ => Err(GameError::NoDrawOffer(self.id.clone())),
        }
    }

    fn finish(&mut self, termination: Termination, winner: Option<Color>) {
        self.state = GameState::Finished;
        self.termination = Some(termination);
        self.winner = winner.map(|color| self.participant(color).clone());
        self.draw_offer = None;
    }

    /// Claim the finished game for rating finalization.
    ///
    /// Returns `Some` once per game; any later call, or a call while the game is
    /// still active, returns `None`.
    pub fn take_finalization(&mut self) -> Option<Finalization> {
        if self.is_active() || self.finalization_taken {
            return None;
        }
        let termination = self.termination?;
        self.finalization_taken = true;

        Some(Finalization {
            white: self.white.clone(),
            black: self.black.clone(),
            winner: self.winner.as_ref().and_then(|w| self.color_of(w)),
            termination,
        })
    }
}
