//! Game rules behind a capability interface.
//!
//! The referee only talks to a [`GameRules`] object, so any two-player,
//! alternating-turn game can share the same turn loop. [`LaskerMorris`] lives
//! here; tic-tac-toe is in [`crate::tictactoe`].

use std::fmt;

use crate::board::Color;
use crate::constants::{DRAW_LINE, END_PREFIX};
use crate::history::{MatchHistory, MatchSnapshot};
use crate::position::Position;

/// Why a game rejected a move. Each game reports its own error type.
pub type RuleViolation = Box<dyn std::error::Error + Send + Sync>;

/// Why a decisive match ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The player to move did not answer before the deadline.
    Timeout,
    /// The player to move sent an illegal or unparseable move.
    InvalidMove,
    /// The player to move had no legal move.
    NoLegalMove,
    /// A color dropped below three pieces.
    PieceCount,
    /// Three marks in a line.
    ThreeInARow,
}

impl EndReason {
    /// Reason text appended to the terminal line.
    pub fn message(self) -> &'static str {
        match self {
            EndReason::Timeout => "Time out!",
            EndReason::InvalidMove => "Invalid move!",
            EndReason::NoLegalMove => "No valid moves available!",
            EndReason::PieceCount => "Ran out of pieces!",
            EndReason::ThreeInARow => "Three in a row!",
        }
    }
}

/// Final result of a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win { winner: Color, reason: EndReason },
    Draw,
}

impl Outcome {
    /// The opponent of `loser` wins.
    pub fn forfeit(loser: Color, reason: EndReason) -> Self {
        Outcome::Win {
            winner: loser.opponent(),
            reason,
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Win { winner, .. } => Some(*winner),
            Outcome::Draw => None,
        }
    }

    /// Line sent to both players when the match ends.
    pub fn terminal_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win { winner, reason } => write!(
                f,
                "{END_PREFIX} {} WINS! {} LOSES! {}",
                winner.token(),
                winner.opponent().token(),
                reason.message()
            ),
            Outcome::Draw => f.write_str(DRAW_LINE),
        }
    }
}

/// What the referee needs from a game implementation.
pub trait GameRules: Send {
    /// Reset to the starting position and clear the history.
    fn initialize(&mut self);

    /// Color whose move is expected next.
    fn to_move(&self) -> Color;

    /// Decode, validate and apply move text for the side to move, recording
    /// it in the history. On error nothing changes.
    fn validate_and_apply(&mut self, text: &str) -> Result<(), RuleViolation>;

    fn has_legal_move(&self, color: Color) -> bool;

    /// Outcome after the last applied move, if the match is over.
    fn determine_outcome(&self) -> Option<Outcome>;

    fn history(&self) -> &MatchHistory;

    /// Current state for viewers. `game_over` and `message` are left for the
    /// referee to fill in.
    fn snapshot(&self) -> MatchSnapshot;

    /// Line sent to both players when the match ends.
    fn terminal_line(&self, outcome: &Outcome) -> String {
        outcome.terminal_line()
    }
}

/// Lasker Morris: ten pieces per side, placing and moving may be mixed.
#[derive(Clone, Debug, Default)]
pub struct LaskerMorris {
    /// Position restored by `initialize`
    start: Position,
    pos: Position,
    history: MatchHistory,
}

impl LaskerMorris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play from an arbitrary position instead of the empty board.
    pub fn from_position(pos: Position) -> Self {
        Self {
            start: pos.clone(),
            pos,
            history: MatchHistory::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }
}

impl GameRules for LaskerMorris {
    fn initialize(&mut self) {
        self.pos = self.start.clone();
        self.history = MatchHistory::new();
    }

    fn to_move(&self) -> Color {
        self.pos.to_move()
    }

    fn validate_and_apply(&mut self, text: &str) -> Result<(), RuleViolation> {
        let mover = self.pos.to_move();
        self.pos.play(text)?;
        let entry = self.history.record(
            mover,
            text,
            self.pos.board().snapshot(),
            Some(self.pos.hands()),
        );
        tracing::debug!(ply = entry.ply, %mover, mv = text, "move applied\n{}", self.pos.board());
        Ok(())
    }

    fn has_legal_move(&self, color: Color) -> bool {
        self.pos.has_legal_move(color)
    }

    fn determine_outcome(&self) -> Option<Outcome> {
        self.pos.determine_outcome()
    }

    fn history(&self) -> &MatchHistory {
        &self.history
    }

    fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            board: self.pos.board().snapshot(),
            hands: Some(self.pos.hands()),
            turn: Some(self.pos.to_move()),
            game_over: false,
            history: self.history.clone(),
            message: None,
        }
    }
}
