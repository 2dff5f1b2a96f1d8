/// Errors that stop a match from being played or recorded.
///
/// Rule violations and timeouts are not errors: they end the match with a
/// forfeit and are reported through [`crate::referee::MatchResult`].
#[derive(Debug, thiserror::Error)]
pub enum RefereeError {
    #[error("failed to launch {player} ({program}): {source}")]
    Launch {
        player: String,
        program: String,
        source: std::io::Error,
    },

    #[error("match has already been played")]
    AlreadyPlayed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when building a match configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config validation error: {0}")]
    Validation(String),
}
