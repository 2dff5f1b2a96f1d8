//! Lasker Morris referee.
//!
//! This crate adjudicates Lasker Morris (and tic-tac-toe) matches between two independently
//! written player programs that speak a line-based text protocol over their
//! standard streams. The referee owns the authoritative board, checks every
//! move, detects the end of the match, times out slow players and records a
//! move-by-move history.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, rule parameters, protocol tokens
//! - [`board`] - Colors, intersections, adjacency, mill detection
//! - [`position`] - Move decoding, validation, application, end conditions
//! - [`rules`] - The `GameRules` interface and the Lasker Morris implementation
//! - [`tictactoe`] - Tic-tac-toe on the same interface
//! - [`history`] - Append-only match history and viewer snapshots
//! - [`channel`] - Subprocess lifecycle and line protocol
//! - [`timeout`] - Deadline-bounded move reads
//! - [`referee`] - The turn loop
//! - [`config`] - Match configuration
//! - [`error`] - Error types
//!
//! ## Protocol
//!
//! 1. Referee → player: `blue` or `orange`. Blue moves first.
//! 2. Player → referee: `<source> <target> <remove>`, e.g. `h1 d3 r0` or
//!    `a7 a4 d3`. `h1`/`h2` take a piece from blue's/orange's hand, `r0`
//!    means nothing is removed.
//! 3. Referee → player: each accepted opponent move, verbatim.
//! 4. Referee → player: `END: blue WINS! orange LOSES! <reason>` or `Draw!`.
//!
//! ## Example
//!
//! ```
//! use lasker_referee::board::Color;
//! use lasker_referee::position::Position;
//!
//! let mut pos = Position::new();
//! pos.play("h1 d2 r0").unwrap();
//! assert_eq!(pos.hand(Color::Blue), 9);
//! assert!(pos.play("h2 d2 r0").is_err());
//! ```

pub mod board;
pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod position;
pub mod referee;
pub mod rules;
pub mod tictactoe;
pub mod timeout;
