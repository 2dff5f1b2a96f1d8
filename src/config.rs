//! Match configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_MOVE_TIMEOUT, TIMEOUT_GRACE};
use crate::error::ConfigError;

/// How to launch one player program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line into program and arguments with POSIX shell
    /// word rules (quotes, backslash escapes). No shell is run.
    pub fn parse(line: &str) -> Result<Self, ConfigError> {
        let words = shlex::split(line).ok_or_else(|| {
            ConfigError::Validation(format!("unbalanced quoting in player command {line:?}"))
        })?;
        let mut words = words.into_iter();
        let program = words
            .next()
            .ok_or_else(|| ConfigError::Validation("player command is empty".into()))?;
        Ok(Self::new(program, words))
    }
}

impl FromStr for PlayerCommand {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Quoted so the text parses back to the same words.
impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = |word: &str| match shlex::try_quote(word) {
            Ok(quoted) => quoted.into_owned(),
            // Only NUL bytes cannot be quoted
            Err(_) => word.to_string(),
        };
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Everything needed to run one match.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Player 1 plays blue unless colors are randomized
    pub players: [PlayerCommand; 2],
    /// Per-move budget, before the fixed grace margin
    pub move_timeout: Duration,
    /// Toss a coin for which player is blue
    pub random_colors: bool,
    /// Directory for per-player operation logs
    pub log_dir: Option<PathBuf>,
    /// Where to write the final snapshot as JSON
    pub history_out: Option<PathBuf>,
}

impl MatchConfig {
    /// Configuration with defaults for everything but the players.
    pub fn new(player1: PlayerCommand, player2: PlayerCommand) -> Self {
        Self {
            players: [player1, player2],
            move_timeout: DEFAULT_MOVE_TIMEOUT,
            random_colors: false,
            log_dir: None,
            history_out: None,
        }
    }

    /// How long to wait for a move before declaring a timeout.
    pub fn deadline(&self) -> Duration {
        self.move_timeout + TIMEOUT_GRACE
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, player) in self.players.iter().enumerate() {
            if player.program.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "player{} command is empty",
                    i + 1
                )));
            }
        }
        if self.move_timeout.is_zero() {
            return Err(ConfigError::Validation("move timeout must be > 0".into()));
        }
        Ok(())
    }
}
