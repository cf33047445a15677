//! Error types.
//!
//! A rejected command never changes match state and never writes to the
//! event log. Only [`CommandError::MatchNotEnded`] is meant to reach the
//! official as a notice; the rest are dropped quietly by the console.

use crate::command::TeamId;
use crate::match_engine::Phase;

/// Reasons a command was rejected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{command} is not allowed during {phase:?}")]
    WrongPhase {
        command: &'static str,
        phase: Phase,
    },
    #[error("the match has ended")]
    MatchEnded,
    #[error("a timeout is already running")]
    TimeoutAlreadyRunning,
    #[error("team {0} has already used its timeout")]
    TimeoutAllotmentUsed(TeamId),
    #[error("no timeout is running")]
    NoTimeoutRunning,
    #[error("a stoppage is already running")]
    StoppageAlreadyRunning,
    #[error("no stoppage is running")]
    NoStoppageRunning,
    #[error("End the match first.")]
    MatchNotEnded,
}

impl CommandError {
    /// Whether the console should surface this rejection to the official
    pub fn is_user_notice(&self) -> bool {
        matches!(self, CommandError::MatchNotEnded)
    }
}

/// Invalid or unreadable match configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_publish_rejection_is_a_notice() {
        assert!(CommandError::MatchNotEnded.is_user_notice());
        assert!(!CommandError::TimeoutAlreadyRunning.is_user_notice());
        assert!(!CommandError::WrongPhase {
            command: "start-match",
            phase: Phase::FirstHalf,
        }
        .is_user_notice());
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(CommandError::MatchNotEnded.to_string(), "End the match first.");
        assert_eq!(
            CommandError::TimeoutAllotmentUsed(TeamId::B).to_string(),
            "team 1 has already used its timeout"
        );
    }
}
