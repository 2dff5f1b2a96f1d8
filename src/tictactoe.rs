//! Tic-tac-toe on the same referee.
//!
//! Cells are `a1`..`c3` (columns `abc`, rows `123`). A move is a single cell
//! label, matched case-insensitively. Blue moves first. Three marks in a row
//! win; a full board without one is a draw.

use std::collections::BTreeMap;
use std::fmt;

use crate::board::Color;
use crate::constants::{END_PREFIX, TTT_CELLS, TTT_LABELS, TTT_LINES};
use crate::history::{MatchHistory, MatchSnapshot};
use crate::rules::{EndReason, GameRules, Outcome, RuleViolation};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    #[error("malformed move {0:?}, expected a cell such as a1")]
    Malformed(String),

    #[error("cell {0} is already taken")]
    Occupied(&'static str),
}

/// Parse a cell label such as `b2` (any case, surrounding space ignored).
pub fn parse_cell(text: &str) -> Option<usize> {
    let text = text.trim().to_ascii_lowercase();
    TTT_LABELS.iter().position(|&label| label == text)
}

/// The 3x3 grid of marks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    cells: [Option<Color>; TTT_CELLS],
}

impl Grid {
    pub fn get(&self, cell: usize) -> Option<Color> {
        self.cells[cell]
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Color owning a complete line, if any.
    pub fn three_in_a_row(&self) -> Option<Color> {
        TTT_LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.cells[a]?;
            (self.cells[b] == Some(mark) && self.cells[c] == Some(mark)).then_some(mark)
        })
    }

    pub fn snapshot(&self) -> BTreeMap<String, Option<Color>> {
        TTT_LABELS
            .iter()
            .zip(self.cells)
            .map(|(label, mark)| (label.to_string(), mark))
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..3).rev() {
            write!(f, "{} ", row + 1)?;
            for col in 0..3 {
                let ch = match self.cells[row * 3 + col] {
                    Some(Color::Blue) => 'X',
                    Some(Color::Orange) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c")
    }
}

#[derive(Clone, Debug)]
pub struct TicTacToe {
    grid: Grid,
    to_move: Color,
    history: MatchHistory,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            to_move: Color::Blue,
            history: MatchHistory::new(),
        }
    }
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    fn play(&mut self, text: &str) -> Result<(), CellError> {
        let cell = parse_cell(text).ok_or_else(|| CellError::Malformed(text.to_string()))?;
        if self.grid.cells[cell].is_some() {
            return Err(CellError::Occupied(TTT_LABELS[cell]));
        }
        self.grid.cells[cell] = Some(self.to_move);
        self.to_move = self.to_move.opponent();
        Ok(())
    }
}

impl GameRules for TicTacToe {
    fn initialize(&mut self) {
        *self = Self::new();
    }

    fn to_move(&self) -> Color {
        self.to_move
    }

    fn validate_and_apply(&mut self, text: &str) -> Result<(), RuleViolation> {
        let mover = self.to_move;
        self.play(text)?;
        let entry = self.history.record(mover, text, self.grid.snapshot(), None);
        tracing::debug!(ply = entry.ply, %mover, mv = text, "move applied\n{}", self.grid);
        Ok(())
    }

    fn has_legal_move(&self, _color: Color) -> bool {
        !self.grid.is_full()
    }

    fn determine_outcome(&self) -> Option<Outcome> {
        if let Some(winner) = self.grid.three_in_a_row() {
            return Some(Outcome::Win {
                winner,
                reason: EndReason::ThreeInARow,
            });
        }
        self.grid.is_full().then_some(Outcome::Draw)
    }

    fn history(&self) -> &MatchHistory {
        &self.history
    }

    fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            board: self.grid.snapshot(),
            hands: None,
            turn: Some(self.to_move),
            game_over: false,
            history: self.history.clone(),
            message: None,
        }
    }

    /// Tic-tac-toe names the colors in capitals.
    fn terminal_line(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Win { winner, reason } => format!(
                "{END_PREFIX} {} WINS! {} LOSES! {}",
                winner.token().to_uppercase(),
                winner.opponent().token().to_uppercase(),
                reason.message()
            ),
            Outcome::Draw => outcome.terminal_line(),
        }
    }
}
