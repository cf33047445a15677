//! Command types for the match engine.
//!
//! Commands are the only way officials mutate a match. Every variant maps
//! to one control on the console.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two teams, identified by a stable index (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TeamId {
    /// Index 0, the left-hand team card
    A = 0,
    /// Index 1, the right-hand team card
    B = 1,
}

impl TeamId {
    /// Both teams, in index order
    pub const ALL: [TeamId; 2] = [TeamId::A, TeamId::B];

    /// Returns the opposing team
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            TeamId::A => TeamId::B,
            TeamId::B => TeamId::A,
        }
    }

    /// Index into two-element team arrays
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl From<TeamId> for u8 {
    fn from(team: TeamId) -> u8 {
        team as u8
    }
}

impl TryFrom<u8> for TeamId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TeamId::A),
            1 => Ok(TeamId::B),
            other => Err(format!("team index must be 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Why an official stopped play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoppageReason {
    /// Ball left the field
    OutOfBounds,
    /// No play for more than ten seconds
    NoPlay,
    /// Bots locked together for more than ten seconds
    BotsStuck,
}

impl StoppageReason {
    /// Label used in the event log
    pub const fn label(self) -> &'static str {
        match self {
            StoppageReason::OutOfBounds => "Out of Bounds",
            StoppageReason::NoPlay => "No Play >10s",
            StoppageReason::BotsStuck => "Bots Stuck >10s",
        }
    }

    /// Short tag shown on the console while the stoppage runs
    pub const fn tag(self) -> &'static str {
        match self {
            StoppageReason::OutOfBounds => "OUT OF BOUNDS",
            StoppageReason::NoPlay => "NO PLAY",
            StoppageReason::BotsStuck => "BOTS STUCK",
        }
    }
}

impl std::str::FromStr for StoppageReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "out-of-bounds" | "oob" => Ok(StoppageReason::OutOfBounds),
            "no-play" => Ok(StoppageReason::NoPlay),
            "bots-stuck" | "stuck" => Ok(StoppageReason::BotsStuck),
            other => Err(format!("unknown stoppage reason '{other}'")),
        }
    }
}

// ============================================================================
// Fixed score reasons
// ============================================================================

pub const GOAL_REASON: &str = "Goal – ball crossed goal plane";
pub const EARLY_START_FOUL_REASON: &str = "Early Start Foul";
pub const MANUAL_ADJUST_REASON: &str = "Score adjust";
pub const TECHNICAL_POINT_REASON: &str = "Technical Point";

// ============================================================================
// Input Commands
// ============================================================================

/// Input commands from the officials
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Kick-off: PRE_MATCH -> FIRST_HALF
    StartMatch,
    /// HALF_TIME -> SECOND_HALF
    BeginSecondHalf,
    /// Pause or resume the half clock
    ToggleClock,
    /// Back to PRE_MATCH with fresh defaults
    ResetMatch,
    /// Team-requested timeout
    CallTimeout(TeamId),
    /// Manually end the running timeout
    EndTimeout,
    /// Official stoppage
    StartStoppage(StoppageReason),
    /// Manually end the running stoppage
    EndStoppage,
    /// +1, ball crossed the goal plane
    Goal(TeamId),
    /// -1 for starting before the whistle
    EarlyStartFoul(TeamId),
    /// Official-awarded +1 technical point
    TechnicalPoint(TeamId),
    /// Generic score adjustment
    AdjustScore {
        team: TeamId,
        delta: i32,
        reason: String,
    },
    /// Flip the advisory bot-out flag
    ToggleBotOut(TeamId),
    /// Change a team's display name
    RenameTeam { team: TeamId, name: String },
    /// Hand the final result to the publish sink
    PublishResult,
}

impl Command {
    /// Kebab-case name, as used in scripts and diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            Command::StartMatch => "start-match",
            Command::BeginSecondHalf => "begin-second-half",
            Command::ToggleClock => "toggle-clock",
            Command::ResetMatch => "reset-match",
            Command::CallTimeout(_) => "call-timeout",
            Command::EndTimeout => "end-timeout",
            Command::StartStoppage(_) => "start-stoppage",
            Command::EndStoppage => "end-stoppage",
            Command::Goal(_) => "goal",
            Command::EarlyStartFoul(_) => "early-start-foul",
            Command::TechnicalPoint(_) => "technical-point",
            Command::AdjustScore { .. } => "adjust-score",
            Command::ToggleBotOut(_) => "toggle-bot-out",
            Command::RenameTeam { .. } => "rename-team",
            Command::PublishResult => "publish-result",
        }
    }
}
