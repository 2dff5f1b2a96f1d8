//! Lasker Morris position and move execution.
//!
//! This module holds the rule engine proper:
//! - Move text decoding (`"h1 d3 r0"`, `"a7 a4 d3"`)
//! - Legality checking in a fixed order (target, source, removal)
//! - Applying and undoing moves
//! - Legal-move availability and terminal-condition detection
//!
//! A color's [`Phase`] is never stored. It is recomputed from the color's hand
//! and on-board counts every time it is needed.

use std::fmt;

use crate::board::{is_adjacent, neighbors, parse_point, str_point, Board, Color, Point};
use crate::constants::{
    BLUE_HAND, DRAW_PLIES, FLYING_PIECES, HAND_SIZE, MIN_PIECES, NO_REMOVAL, ORANGE_HAND,
};
use crate::history::Hands;
use crate::rules::{EndReason, Outcome};

/// Movement rule in force for a color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Pieces remain in hand: place anywhere empty, or slide to a neighbor.
    Hand,
    /// Hand is empty and more than three pieces remain: slide to a neighbor.
    Mobile,
    /// Three pieces left in hand and on board together: board pieces jump to
    /// any empty intersection. Pieces still in hand may be placed as usual.
    Flying,
}

/// Where a moved piece comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Hand(Color),
    Board(Point),
}

/// A decoded move: source, target, optional removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub source: Source,
    pub target: Point,
    pub remove: Option<Point>,
}

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("malformed move {0:?}")]
    Malformed(String),

    #[error("target {0} is not empty")]
    TargetOccupied(&'static str),

    #[error("{mover} cannot take pieces from the other player's hand")]
    WrongHand { mover: Color },

    #[error("{mover} has no pieces left in hand")]
    EmptyHand { mover: Color },

    #[error("{0} is not occupied by the moving player")]
    NotOwnPiece(&'static str),

    #[error("{from} is not adjacent to {to}")]
    NotAdjacent {
        from: &'static str,
        to: &'static str,
    },

    #[error("move completes a mill at {0} but removes nothing")]
    MissingRemoval(&'static str),

    #[error("move removes {0} without completing a mill")]
    UnexpectedRemoval(&'static str),

    #[error("{0} is not an opponent piece")]
    RemoveNotOpponent(&'static str),

    #[error("{0} is in a mill while other opponent pieces are not")]
    RemoveProtected(&'static str),
}

impl MoveError {
    /// Whether the move text could not be decoded at all.
    pub fn is_malformed(&self) -> bool {
        matches!(self, MoveError::Malformed(_))
    }
}

impl Move {
    /// Decode move text of the form `"<source> <target> <remove>"`.
    ///
    /// Only the token shapes are checked here; whether the move is legal
    /// is decided by [`Position::validate`].
    pub fn parse(text: &str) -> Result<Move, MoveError> {
        let malformed = || MoveError::Malformed(text.to_string());
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let &[source, target, remove] = tokens.as_slice() else {
            return Err(malformed());
        };

        let source = match source {
            BLUE_HAND => Source::Hand(Color::Blue),
            ORANGE_HAND => Source::Hand(Color::Orange),
            s => Source::Board(parse_point(s).ok_or_else(malformed)?),
        };
        let target = parse_point(target).ok_or_else(malformed)?;
        let remove = match remove {
            NO_REMOVAL => None,
            r => Some(parse_point(r).ok_or_else(malformed)?),
        };

        Ok(Move {
            source,
            target,
            remove,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            Source::Hand(Color::Blue) => BLUE_HAND,
            Source::Hand(Color::Orange) => ORANGE_HAND,
            Source::Board(pt) => str_point(pt),
        };
        let remove = self.remove.map(str_point).unwrap_or(NO_REMOVAL);
        write!(f, "{source} {} {remove}", str_point(self.target))
    }
}

/// Everything needed to take back an applied move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Undo {
    pub mover: Color,
    pub mv: Move,
    pub plies_without_capture: u32,
}

/// A Lasker Morris position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    board: Board,
    hands: Hands,
    to_move: Color,
    /// Consecutive plies since the last capture
    plies_without_capture: u32,
    /// Plies played so far
    ply: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// Empty board, full hands, blue to move.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            hands: Hands::full(HAND_SIZE),
            to_move: Color::Blue,
            plies_without_capture: 0,
            ply: 0,
        }
    }

    /// Build an arbitrary position from labels.
    ///
    /// Fails with [`MoveError::Malformed`] on an unknown label and with
    /// [`MoveError::TargetOccupied`] if a label is listed twice.
    pub fn from_layout(
        blue: &[&str],
        orange: &[&str],
        hands: Hands,
        to_move: Color,
    ) -> Result<Self, MoveError> {
        let mut board = Board::new();
        for (color, labels) in [(Color::Blue, blue), (Color::Orange, orange)] {
            for &label in labels {
                let pt = parse_point(label).ok_or_else(|| MoveError::Malformed(label.into()))?;
                if !board.is_empty_at(pt) {
                    return Err(MoveError::TargetOccupied(str_point(pt)));
                }
                board.set(pt, Some(color));
            }
        }
        Ok(Self {
            board,
            hands,
            to_move,
            plies_without_capture: 0,
            ply: 0,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn hands(&self) -> Hands {
        self.hands
    }

    pub fn hand(&self, color: Color) -> u8 {
        self.hands.get(color)
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn plies_without_capture(&self) -> u32 {
        self.plies_without_capture
    }

    pub fn ply(&self) -> usize {
        self.ply
    }

    /// Pieces of `color` on the board.
    pub fn on_board(&self, color: Color) -> usize {
        self.board.count(color)
    }

    /// Pieces of `color` in hand and on the board.
    pub fn total_pieces(&self, color: Color) -> usize {
        self.hand(color) as usize + self.on_board(color)
    }

    /// Movement rule currently in force for `color`.
    pub fn phase(&self, color: Color) -> Phase {
        if self.total_pieces(color) <= FLYING_PIECES {
            Phase::Flying
        } else if self.hand(color) > 0 {
            Phase::Hand
        } else {
            Phase::Mobile
        }
    }

    /// Check a move for the side to move without changing anything.
    ///
    /// Checks run in order: target, source, removal.
    pub fn validate(&self, mv: &Move) -> Result<(), MoveError> {
        let mover = self.to_move;
        let opponent = mover.opponent();

        if !self.board.is_empty_at(mv.target) {
            return Err(MoveError::TargetOccupied(str_point(mv.target)));
        }

        let vacated = match mv.source {
            Source::Hand(color) => {
                if color != mover {
                    return Err(MoveError::WrongHand { mover });
                }
                if self.hand(mover) == 0 {
                    return Err(MoveError::EmptyHand { mover });
                }
                None
            }
            Source::Board(from) => {
                if self.board.get(from) != Some(mover) {
                    return Err(MoveError::NotOwnPiece(str_point(from)));
                }
                if self.phase(mover) != Phase::Flying && !is_adjacent(from, mv.target) {
                    return Err(MoveError::NotAdjacent {
                        from: str_point(from),
                        to: str_point(mv.target),
                    });
                }
                Some(from)
            }
        };

        let mill = self.board.completes_mill(mv.target, mover, vacated);
        match (mill, mv.remove) {
            (false, None) => Ok(()),
            (false, Some(r)) => Err(MoveError::UnexpectedRemoval(str_point(r))),
            (true, None) => Err(MoveError::MissingRemoval(str_point(mv.target))),
            (true, Some(r)) => {
                if self.board.get(r) != Some(opponent) {
                    return Err(MoveError::RemoveNotOpponent(str_point(r)));
                }
                let all_in_mills = self.board.pieces(opponent).all(|p| self.board.in_mill(p));
                if self.board.in_mill(r) && !all_in_mills {
                    return Err(MoveError::RemoveProtected(str_point(r)));
                }
                Ok(())
            }
        }
    }

    /// Validate and apply a move for the side to move.
    ///
    /// On error the position is left untouched.
    pub fn apply(&mut self, mv: Move) -> Result<Undo, MoveError> {
        self.validate(&mv)?;

        let mover = self.to_move;
        let undo = Undo {
            mover,
            mv,
            plies_without_capture: self.plies_without_capture,
        };

        match mv.source {
            Source::Hand(_) => *self.hands.get_mut(mover) -= 1,
            Source::Board(from) => self.board.set(from, None),
        }
        self.board.set(mv.target, Some(mover));
        match mv.remove {
            Some(r) => {
                self.board.set(r, None);
                self.plies_without_capture = 0;
            }
            None => self.plies_without_capture += 1,
        }

        self.to_move = mover.opponent();
        self.ply += 1;
        Ok(undo)
    }

    /// Decode and apply move text.
    pub fn play(&mut self, text: &str) -> Result<Undo, MoveError> {
        let mv = Move::parse(text)?;
        self.apply(mv)
    }

    /// Take back a move previously returned by [`Position::apply`].
    pub fn undo(&mut self, undo: Undo) {
        let Undo {
            mover,
            mv,
            plies_without_capture,
        } = undo;

        if let Some(r) = mv.remove {
            self.board.set(r, Some(mover.opponent()));
        }
        self.board.set(mv.target, None);
        match mv.source {
            Source::Hand(_) => *self.hands.get_mut(mover) += 1,
            Source::Board(from) => self.board.set(from, Some(mover)),
        }

        self.plies_without_capture = plies_without_capture;
        self.to_move = mover;
        self.ply -= 1;
    }

    /// Whether `color` has at least one legal move.
    pub fn has_legal_move(&self, color: Color) -> bool {
        match self.phase(color) {
            Phase::Hand | Phase::Flying => self.board.empties().next().is_some(),
            Phase::Mobile => self
                .board
                .pieces(color)
                .any(|p| neighbors(p).any(|n| self.board.is_empty_at(n))),
        }
    }

    /// Piece-count loss or non-capture draw, if either applies.
    ///
    /// Immobilization is not checked here: the referee checks it before
    /// asking for a move.
    pub fn determine_outcome(&self) -> Option<Outcome> {
        for color in Color::BOTH {
            if self.total_pieces(color) < MIN_PIECES {
                return Some(Outcome::Win {
                    winner: color.opponent(),
                    reason: EndReason::PieceCount,
                });
            }
        }
        if self.plies_without_capture >= DRAW_PLIES {
            return Some(Outcome::Draw);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(s: &str) -> Point {
        parse_point(s).unwrap()
    }

    fn hands(blue: u8, orange: u8) -> Hands {
        Hands { blue, orange }
    }

    #[test]
    fn test_parse_hand_move() {
        let mv = Move::parse("h1 d3 r0").unwrap();
        assert_eq!(mv.source, Source::Hand(Color::Blue));
        assert_eq!(mv.target, pt("d3"));
        assert_eq!(mv.remove, None);
        assert_eq!(mv.to_string(), "h1 d3 r0");
    }

    #[test]
    fn test_parse_board_move_with_removal() {
        let mv = Move::parse("a7 a4 d3").unwrap();
        assert_eq!(mv.source, Source::Board(pt("a7")));
        assert_eq!(mv.target, pt("a4"));
        assert_eq!(mv.remove, Some(pt("d3")));
    }

    #[test]
    fn test_parse_malformed() {
        for text in ["", "h1 d3", "h1 d3 r0 x", "h3 d3 r0", "h1 d4 r0", "h1 d3 r1", "H1 D3 R0"] {
            let err = Move::parse(text).unwrap_err();
            assert!(err.is_malformed(), "{text:?} gave {err}");
        }
    }

    #[test]
    fn test_phase_is_derived() {
        let pos = Position::new();
        assert_eq!(pos.phase(Color::Blue), Phase::Hand);

        let pos = Position::from_layout(&["a1", "a4", "d2", "f4"], &["g7"], hands(0, 0), Color::Blue)
            .unwrap();
        assert_eq!(pos.phase(Color::Blue), Phase::Mobile);

        let pos =
            Position::from_layout(&["a1", "a4", "d2"], &["g7"], hands(0, 0), Color::Blue).unwrap();
        assert_eq!(pos.phase(Color::Blue), Phase::Flying);

        // Three on board but still holding pieces is not flying
        let pos =
            Position::from_layout(&["a1", "a4", "d2"], &["g7"], hands(1, 0), Color::Blue).unwrap();
        assert_eq!(pos.phase(Color::Blue), Phase::Hand);

        // Hand and board together decide
        let pos = Position::from_layout(&["a1", "g7"], &["d2"], hands(1, 0), Color::Blue).unwrap();
        assert_eq!(pos.phase(Color::Blue), Phase::Flying);
    }

    #[test]
    fn test_target_must_be_empty() {
        let mut pos = Position::new();
        pos.play("h1 d2 r0").unwrap();
        let err = pos.play("h2 d2 r0").unwrap_err();
        assert_eq!(err, MoveError::TargetOccupied("d2"));
    }

    #[test]
    fn test_wrong_hand() {
        let mut pos = Position::new();
        let err = pos.play("h2 d2 r0").unwrap_err();
        assert_eq!(err, MoveError::WrongHand { mover: Color::Blue });
    }

    #[test]
    fn test_empty_hand() {
        let mut pos =
            Position::from_layout(&["a1", "d2", "f4", "g7"], &["b6"], hands(0, 3), Color::Blue)
                .unwrap();
        assert_eq!(
            pos.play("h1 d3 r0").unwrap_err(),
            MoveError::EmptyHand { mover: Color::Blue }
        );
    }

    #[test]
    fn test_board_move_needs_own_piece() {
        let mut pos =
            Position::from_layout(&["a1"], &["d2"], hands(5, 5), Color::Blue).unwrap();
        assert_eq!(pos.play("d2 d3 r0").unwrap_err(), MoveError::NotOwnPiece("d2"));
        assert_eq!(pos.play("c3 d3 r0").unwrap_err(), MoveError::NotOwnPiece("c3"));
    }

    #[test]
    fn test_slide_while_holding_pieces() {
        let mut pos =
            Position::from_layout(&["a1"], &["d2"], hands(5, 5), Color::Blue).unwrap();
        assert_eq!(
            pos.play("a1 a7 r0").unwrap_err(),
            MoveError::NotAdjacent { from: "a1", to: "a7" }
        );
        pos.play("a1 a4 r0").unwrap();
        assert_eq!(pos.hand(Color::Blue), 5);
        assert_eq!(pos.board().get(pt("a4")), Some(Color::Blue));
        assert!(pos.board().is_empty_at(pt("a1")));
    }

    #[test]
    fn test_mobile_requires_adjacency() {
        let mut pos = Position::from_layout(
            &["a1", "d2", "f4", "g7"],
            &["b6", "c3", "e5", "g1"],
            hands(0, 0),
            Color::Blue,
        )
        .unwrap();
        assert!(matches!(pos.play("d2 d6 r0"), Err(MoveError::NotAdjacent { .. })));
        pos.play("d2 d3 r0").unwrap();
    }

    #[test]
    fn test_flying_moves_anywhere() {
        let mut pos = Position::from_layout(
            &["a1", "d2", "f4"],
            &["b6", "c3", "e5", "g1"],
            hands(0, 0),
            Color::Blue,
        )
        .unwrap();
        pos.play("a1 d7 r0").unwrap();
        assert_eq!(pos.board().get(pt("d7")), Some(Color::Blue));
    }

    #[test]
    fn test_flying_counts_pieces_in_hand() {
        let mut pos = Position::from_layout(
            &["a1", "g7"],
            &["b6", "c3", "e5", "g1"],
            hands(1, 0),
            Color::Blue,
        )
        .unwrap();
        pos.play("a1 d7 r0").unwrap();
        assert_eq!(pos.board().get(pt("d7")), Some(Color::Blue));
        assert_eq!(pos.hand(Color::Blue), 1);

        // The last piece in hand can still be placed
        pos.play("g1 g4 r0").unwrap();
        pos.play("h1 a1 r0").unwrap();
        assert_eq!(pos.hand(Color::Blue), 0);
    }

    #[test]
    fn test_moving_out_of_line_does_not_count_as_mill() {
        // a4 slides to a7: a1-a4-a7 is not complete because a4 is vacated
        let mut pos =
            Position::from_layout(&["a1", "a4"], &["d3"], hands(5, 5), Color::Blue).unwrap();
        pos.play("a4 a7 r0").unwrap();
    }

    #[test]
    fn test_removal_requires_mill() {
        let mut pos = Position::from_layout(&["a1"], &["d3"], hands(5, 5), Color::Blue).unwrap();
        assert_eq!(pos.play("h1 a4 d3").unwrap_err(), MoveError::UnexpectedRemoval("d3"));
    }

    #[test]
    fn test_remove_must_be_opponent() {
        let mut pos =
            Position::from_layout(&["a1", "a4", "g1"], &["d3"], hands(5, 5), Color::Blue).unwrap();
        assert_eq!(pos.play("h1 a7 g1").unwrap_err(), MoveError::RemoveNotOpponent("g1"));
        assert_eq!(pos.play("h1 a7 e3").unwrap_err(), MoveError::RemoveNotOpponent("e3"));
    }

    #[test]
    fn test_remove_protected_by_mill() {
        let mut pos = Position::from_layout(
            &["a1", "a4"],
            &["b2", "b4", "b6", "d3"],
            hands(5, 5),
            Color::Blue,
        )
        .unwrap();
        assert_eq!(pos.play("h1 a7 b4").unwrap_err(), MoveError::RemoveProtected("b4"));
        pos.play("h1 a7 d3").unwrap();
    }

    #[test]
    fn test_remove_from_mill_when_all_in_mills() {
        let mut pos =
            Position::from_layout(&["a1", "a4"], &["b2", "b4", "b6"], hands(5, 5), Color::Blue)
                .unwrap();
        pos.play("h1 a7 b4").unwrap();
        assert!(pos.board().is_empty_at(pt("b4")));
    }

    #[test]
    fn test_mill_requires_removal_even_with_empty_opponent_board() {
        // Orange's pieces are all still in hand
        let mut pos = Position::from_layout(&["a1", "a4"], &[], hands(5, 5), Color::Blue).unwrap();
        assert_eq!(pos.play("h1 a7 r0").unwrap_err(), MoveError::MissingRemoval("a7"));
        assert!(pos.board().is_empty_at(pt("a7")));
        assert_eq!(pos.hand(Color::Blue), 5);
    }

    #[test]
    fn test_failed_move_leaves_position_untouched() {
        let mut pos =
            Position::from_layout(&["a1", "a4"], &["d3"], hands(5, 5), Color::Blue).unwrap();
        let before = pos.clone();
        assert!(pos.play("h1 a7 r0").is_err());
        assert_eq!(pos, before);
    }

    #[test]
    fn test_apply_then_undo_restores_position() {
        let mut pos = Position::from_layout(
            &["a1", "a4", "c4"],
            &["d3", "g7", "e4"],
            hands(2, 3),
            Color::Blue,
        )
        .unwrap();
        pos.play("h1 d2 r0").unwrap();
        pos.play("h2 f2 r0").unwrap();
        let before = pos.clone();

        for text in ["h1 a7 d3", "c4 c3 r0", "c4 b4 r0"] {
            let undo = pos.play(text).unwrap();
            assert_ne!(pos, before);
            pos.undo(undo);
            assert_eq!(pos, before, "undo of {text}");
        }
    }

    #[test]
    fn test_draw_counter() {
        let mut pos =
            Position::from_layout(&["a1", "a4"], &["d3", "g7"], hands(5, 5), Color::Blue).unwrap();
        pos.play("h1 d2 r0").unwrap();
        pos.play("h2 f2 r0").unwrap();
        assert_eq!(pos.plies_without_capture(), 2);
        pos.play("h1 a7 d3").unwrap();
        assert_eq!(pos.plies_without_capture(), 0);
        pos.play("h2 f4 r0").unwrap();
        assert_eq!(pos.plies_without_capture(), 1);
    }

    #[test]
    fn test_has_legal_move_hand_phase() {
        let pos = Position::new();
        assert!(pos.has_legal_move(Color::Blue));
        assert!(pos.has_legal_move(Color::Orange));
    }

    #[test]
    fn test_blocked_in_mobile_phase() {
        // Blue's pieces on the outer corners, every neighbor taken by orange
        let pos = Position::from_layout(
            &["a1", "g1", "a7", "g7"],
            &["a4", "d1", "g4", "d7"],
            hands(0, 0),
            Color::Blue,
        )
        .unwrap();
        assert!(!pos.has_legal_move(Color::Blue));
        assert!(pos.has_legal_move(Color::Orange));
    }

    #[test]
    fn test_flying_is_never_blocked_with_empties() {
        let pos = Position::from_layout(
            &["a1", "g1", "a7"],
            &["a4", "d1", "g4", "d7"],
            hands(0, 0),
            Color::Blue,
        )
        .unwrap();
        assert!(pos.has_legal_move(Color::Blue));
    }

    #[test]
    fn test_determine_outcome_piece_count() {
        let pos =
            Position::from_layout(&["a1", "a4", "d2"], &["g7", "g4"], hands(0, 0), Color::Blue)
                .unwrap();
        assert_eq!(
            pos.determine_outcome(),
            Some(Outcome::Win {
                winner: Color::Blue,
                reason: EndReason::PieceCount,
            })
        );
    }

    #[test]
    fn test_determine_outcome_ongoing() {
        assert_eq!(Position::new().determine_outcome(), None);
    }
}
