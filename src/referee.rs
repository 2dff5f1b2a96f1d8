//! Match orchestration: the referee's turn loop.
//!
//! The referee owns both player channels and a [`GameRules`] object and is
//! the only thing that mutates game state. One match runs as:
//!
//! 1. Reset the rules, start both players, send each its color line.
//! 2. Before asking for a move, check that the side to move has one;
//!    if not, the opponent wins.
//! 3. Read the move through the [`TimeoutGate`]. A timeout, or a move the
//!    rules reject, forfeits the match.
//! 4. Relay the accepted move text verbatim to the other player, then check
//!    for a piece-count loss or a draw.
//! 5. Switch sides and repeat.
//!
//! Every way out of the loop, errors included, passes through one cleanup
//! routine that stops both players.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::board::Color;
use crate::channel::PlayerChannel;
use crate::config::MatchConfig;
use crate::error::RefereeError;
use crate::history::MatchSnapshot;
use crate::rules::{EndReason, GameRules, Outcome};
use crate::timeout::{MoveRead, TimeoutGate};

/// Where the turn loop is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    NotStarted,
    AwaitingMove,
    ApplyingMove,
    GameOver,
}

/// How a match ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub outcome: Outcome,
    /// Terminal line sent to both players
    pub message: String,
    /// Accepted plies
    pub plies: usize,
    /// Rule violation behind an invalid-move forfeit
    pub detail: Option<String>,
}

/// Read-only view of the match, updated by the referee as play goes on.
#[derive(Clone, Default)]
pub struct SnapshotWatch {
    inner: Arc<RwLock<MatchSnapshot>>,
}

impl SnapshotWatch {
    /// Copy of the most recently published state.
    pub fn get(&self) -> MatchSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, snapshot: MatchSnapshot) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

pub struct Referee {
    rules: Box<dyn GameRules>,
    /// Indexed by [`Color::index`]
    players: [PlayerChannel; 2],
    gate: TimeoutGate,
    state: LoopState,
    watch: SnapshotWatch,
}

impl Referee {
    pub fn new(
        rules: Box<dyn GameRules>,
        blue: PlayerChannel,
        orange: PlayerChannel,
        move_timeout: Duration,
    ) -> Self {
        Self {
            rules,
            players: [blue, orange],
            gate: TimeoutGate::new(move_timeout),
            state: LoopState::NotStarted,
            watch: SnapshotWatch::default(),
        }
    }

    /// Build channels from `config`. Player 1 is blue unless the config asks
    /// for a coin toss.
    pub fn from_config(config: &MatchConfig, rules: Box<dyn GameRules>) -> Self {
        let [first, second] = [0, 1].map(|i| {
            let name = format!("player{}", i + 1);
            let channel = PlayerChannel::new(name.as_str(), config.players[i].clone());
            match &config.log_dir {
                Some(dir) => channel.with_log(dir.join(format!("{name}.log"))),
                None => channel,
            }
        });

        let (blue, orange) = if config.random_colors && fastrand::bool() {
            (second, first)
        } else {
            (first, second)
        };
        tracing::info!(blue = blue.name(), orange = orange.name(), "colors assigned");
        Self::new(rules, blue, orange, config.move_timeout)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn player(&self, color: Color) -> &PlayerChannel {
        &self.players[color.index()]
    }

    pub fn rules(&self) -> &dyn GameRules {
        self.rules.as_ref()
    }

    /// Handle for polling the match state from another thread.
    pub fn watch(&self) -> SnapshotWatch {
        self.watch.clone()
    }

    /// Play the match to the end. A referee plays exactly one match.
    ///
    /// Returns an error only if the match could not be played (a player
    /// failed to launch, or a worker thread could not be spawned). Both
    /// players are stopped before this returns, whatever the result.
    pub fn run(&mut self) -> Result<MatchResult, RefereeError> {
        if self.state != LoopState::NotStarted {
            return Err(RefereeError::AlreadyPlayed);
        }
        let result = self.play();
        self.shutdown();
        result
    }

    fn play(&mut self) -> Result<MatchResult, RefereeError> {
        self.rules.initialize();
        for color in Color::BOTH {
            self.players[color.index()].start()?;
        }
        for color in Color::BOTH {
            self.send(color, color.token());
        }
        self.state = LoopState::AwaitingMove;
        self.publish(None);
        tracing::info!(deadline = ?self.gate.deadline(), "match started");

        loop {
            let mover = self.rules.to_move();

            if !self.rules.has_legal_move(mover) {
                tracing::info!(%mover, "no legal move");
                return Ok(self.finish(Outcome::forfeit(mover, EndReason::NoLegalMove), None));
            }

            let line = match self.gate.read_move(&self.players[mover.index()])? {
                MoveRead::Line(line) => line,
                MoveRead::TimedOut => {
                    tracing::warn!(%mover, "move timed out");
                    return Ok(self.finish(Outcome::forfeit(mover, EndReason::Timeout), None));
                }
            };

            self.state = LoopState::ApplyingMove;
            if let Err(err) = self.rules.validate_and_apply(&line) {
                tracing::warn!(%mover, mv = %line, error = %err, "invalid move");
                let outcome = Outcome::forfeit(mover, EndReason::InvalidMove);
                return Ok(self.finish(outcome, Some(err.to_string())));
            }
            self.send(mover.opponent(), &line);
            self.publish(None);

            if let Some(outcome) = self.rules.determine_outcome() {
                return Ok(self.finish(outcome, None));
            }
            self.state = LoopState::AwaitingMove;
        }
    }

    /// Notify both players, stop them, and record the result.
    fn finish(&mut self, outcome: Outcome, detail: Option<String>) -> MatchResult {
        let message = self.rules.terminal_line(&outcome);
        for color in Color::BOTH {
            self.send(color, &message);
        }
        self.shutdown();
        self.publish(Some(message.clone()));

        let plies = self.rules.history().len();
        tracing::info!(%message, plies, "match over");
        MatchResult {
            outcome,
            message,
            plies,
            detail,
        }
    }

    /// Stop both players. Safe to call any number of times.
    fn shutdown(&mut self) {
        for player in &mut self.players {
            player.stop();
        }
        self.state = LoopState::GameOver;
    }

    /// Write a line to one player. A player that cannot be written to will
    /// fail its next read, so errors are only logged.
    fn send(&mut self, color: Color, line: &str) {
        let player = &mut self.players[color.index()];
        if let Err(e) = player.write(line) {
            tracing::warn!(player = player.name(), %color, error = %e, "write failed");
        }
    }

    fn publish(&self, message: Option<String>) {
        let mut snapshot = self.rules.snapshot();
        snapshot.game_over = self.state == LoopState::GameOver;
        if snapshot.game_over {
            snapshot.turn = None;
        }
        snapshot.message = message;
        self.watch.publish(snapshot);
    }
}
