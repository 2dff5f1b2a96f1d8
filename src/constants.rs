//! Board geometry, rule parameters, and protocol tokens.
//!
//! The Lasker Morris board has 24 intersections laid out on three nested
//! squares. Intersections are labelled with a column letter `a`-`g` and a row
//! digit `1`-`7`; only 24 of the 49 possible labels are real intersections.
//!
//! ```text
//! 7  a7 ----------- d7 ----------- g7
//! 6  |    b6 ------ d6 ------ f6    |
//! 5  |    |    c5 - d5 - e5    |    |
//! 4  a4 - b4 - c4        e4 - f4 - g4
//! 3  |    |    c3 - d3 - e3    |    |
//! 2  |    b2 ------ d2 ------ f2    |
//! 1  a1 ----------- d1 ----------- g1
//!    a    b    c    d    e    f    g
//! ```
//!
//! Intersections are stored as indices into [`POINTS`], which is sorted by
//! column then row.

use std::time::Duration;

use crate::board::Point;

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of valid intersections.
pub const NUM_POINTS: usize = 24;

/// Labels of every valid intersection, indexed by [`Point`].
pub const POINTS: [&str; NUM_POINTS] = [
    "a1", "a4", "a7", // 0..3
    "b2", "b4", "b6", // 3..6
    "c3", "c4", "c5", // 6..9
    "d1", "d2", "d3", // 9..12
    "d5", "d6", "d7", // 12..15
    "e3", "e4", "e5", // 15..18
    "f2", "f4", "f6", // 18..21
    "g1", "g4", "g7", // 21..24
];

/// Number of mill lines.
pub const NUM_MILLS: usize = 16;

/// The 16 lines of three intersections. Consecutive entries in a line are
/// directly connected, so these lines also define the adjacency graph.
pub static MILLS: [[Point; 3]; NUM_MILLS] = [
    // Rows
    [0, 9, 21],   // a1 d1 g1
    [3, 10, 18],  // b2 d2 f2
    [6, 11, 15],  // c3 d3 e3
    [1, 4, 7],    // a4 b4 c4
    [16, 19, 22], // e4 f4 g4
    [8, 12, 17],  // c5 d5 e5
    [5, 13, 20],  // b6 d6 f6
    [2, 14, 23],  // a7 d7 g7
    // Columns
    [0, 1, 2],    // a1 a4 a7
    [3, 4, 5],    // b2 b4 b6
    [6, 7, 8],    // c3 c4 c5
    [9, 10, 11],  // d1 d2 d3
    [12, 13, 14], // d5 d6 d7
    [15, 16, 17], // e3 e4 e5
    [18, 19, 20], // f2 f4 f6
    [21, 22, 23], // g1 g4 g7
];

// =============================================================================
// Tic-tac-toe Geometry
// =============================================================================
//
//   3  a3 b3 c3
//   2  a2 b2 c2
//   1  a1 b1 c1
//       a  b  c

/// Number of tic-tac-toe cells.
pub const TTT_CELLS: usize = 9;

/// Cell labels, row by row from `a1`.
pub const TTT_LABELS: [&str; TTT_CELLS] = ["a1", "b1", "c1", "a2", "b2", "c2", "a3", "b3", "c3"];

/// Rows, columns and both diagonals, as cell indices.
pub const TTT_LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // a1 b1 c1
    [3, 4, 5], // a2 b2 c2
    [6, 7, 8], // a3 b3 c3
    [0, 3, 6], // a1 a2 a3
    [1, 4, 7], // b1 b2 b3
    [2, 5, 8], // c1 c2 c3
    [0, 4, 8], // a1 b2 c3
    [6, 4, 2], // a3 b2 c1
];

// =============================================================================
// Rule Parameters
// =============================================================================

/// Pieces each color starts with in hand.
pub const HAND_SIZE: u8 = 10;

/// Pieces left (hand + board) at which a color's board pieces may fly.
pub const FLYING_PIECES: usize = 3;

/// A color with fewer pieces than this (hand + board) has lost.
pub const MIN_PIECES: usize = 3;

/// Consecutive plies without a capture that end the match in a draw.
pub const DRAW_PLIES: u32 = 20;

// =============================================================================
// Protocol Tokens
// =============================================================================

/// Source token for placing one of blue's pieces from hand.
pub const BLUE_HAND: &str = "h1";

/// Source token for placing one of orange's pieces from hand.
pub const ORANGE_HAND: &str = "h2";

/// Removal token meaning "no capture".
pub const NO_REMOVAL: &str = "r0";

/// Prefix of the terminal line sent to both players on a decisive result.
pub const END_PREFIX: &str = "END:";

/// Terminal line sent to both players on a draw.
pub const DRAW_LINE: &str = "Draw!";

// =============================================================================
// Timing
// =============================================================================

/// Default per-move time budget.
pub const DEFAULT_MOVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed margin added to the per-move budget before a player is timed out.
pub const TIMEOUT_GRACE: Duration = Duration::from_millis(500);

/// How long a stopping player gets to exit on its own after its input is
/// closed, before it is asked to terminate.
pub const STOP_GRACE: Duration = Duration::from_millis(500);

/// How long a player gets to exit after the termination request before it
/// is killed.
pub const TERM_GRACE: Duration = Duration::from_millis(500);

/// Poll interval while waiting for a stopping player to exit.
pub const STOP_POLL: Duration = Duration::from_millis(10);
