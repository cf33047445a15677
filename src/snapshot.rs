//! Read-only views of a match: the live snapshot and the published result.

use crate::clock::fmt_clock;
use crate::command::TeamId;
use crate::log::LogEntry;
use crate::match_engine::Phase;
use crate::stoppage::StoppageState;
use crate::team::Team;
use crate::timeout::{TimeoutSeverity, TimeoutState};
use serde::Serialize;
use std::cmp::Ordering;

/// Decide the winner from final records.
///
/// A lone disqualification hands the match to the other team whatever the
/// score. Otherwise the higher score wins; a level score is a tie.
pub fn decide_winner(teams: &[Team; 2]) -> Option<TeamId> {
    match (teams[0].disqualified, teams[1].disqualified) {
        (true, false) => return Some(TeamId::B),
        (false, true) => return Some(TeamId::A),
        _ => {}
    }
    match teams[0].score.cmp(&teams[1].score) {
        Ordering::Greater => Some(TeamId::A),
        Ordering::Less => Some(TeamId::B),
        Ordering::Equal => None,
    }
}

/// Everything a rendering panel needs, captured at one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub phase: Phase,
    pub half_index: u8,
    pub half_remaining: u32,
    pub half_time_remaining: u32,
    pub running: bool,
    pub clock_disabled: bool,
    pub teams: [Team; 2],
    pub timeout: TimeoutState,
    pub timeout_severity: Option<TimeoutSeverity>,
    pub stoppage: StoppageState,
    /// Newest first
    pub log: Vec<LogEntry>,
    pub total_played: u32,
    pub total_remaining: u32,
    pub winner: Option<TeamId>,
}

impl MatchSnapshot {
    pub fn team(&self, team: TeamId) -> &Team {
        &self.teams[team.index()]
    }

    /// Phase badge, e.g. `1ST HALF • H1`
    pub fn phase_badge(&self) -> String {
        if self.phase.is_half() {
            format!("{} • H{}", self.phase.label(), self.half_index + 1)
        } else {
            self.phase.label().to_string()
        }
    }

    /// Big clock text for the current phase
    pub fn main_clock(&self) -> String {
        match self.phase {
            Phase::PreMatch => "READY".to_string(),
            Phase::FirstHalf | Phase::SecondHalf => fmt_clock(self.half_remaining),
            Phase::HalfTime => fmt_clock(self.half_time_remaining),
            Phase::Ended => "FULL TIME".to_string(),
        }
    }

    /// `Winner: <name>` or the tie line, only at full time
    pub fn result_line(&self) -> Option<String> {
        if self.phase != Phase::Ended {
            return None;
        }
        Some(match self.winner {
            Some(team) => format!("Winner: {}", self.team(team).name),
            None => "Tie — Referee decision".to_string(),
        })
    }
}

/// Final result handed to the publish sink
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub teams: [Team; 2],
    /// `null` for a tie left to the referee
    pub winner: Option<TeamId>,
    /// Rendered entries, newest first
    pub log: Vec<String>,
}

impl MatchResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
