//! Team records.

use crate::config::TIMEOUTS_PER_TEAM;
use serde::Serialize;

/// One participant's record. Serialized in the shape the leaderboard
/// submission expects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    pub score: u32,
    pub timeouts_used: u8,
    pub is_bot_out: bool,
    pub disqualified: bool,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            timeouts_used: 0,
            is_bot_out: false,
            disqualified: false,
        }
    }

    /// Apply a score delta, flooring at zero. Returns the new score.
    pub fn adjust_score(&mut self, delta: i32) -> u32 {
        let next = (i64::from(self.score) + i64::from(delta)).clamp(0, i64::from(u32::MAX));
        self.score = next as u32;
        self.score
    }

    #[inline]
    pub fn has_timeout_left(&self) -> bool {
        self.timeouts_used < TIMEOUTS_PER_TEAM
    }

    /// Record one timeout against the allotment, never past the cap.
    pub fn use_timeout(&mut self) {
        self.timeouts_used = (self.timeouts_used + 1).min(TIMEOUTS_PER_TEAM);
    }

    /// Latch the team as disqualified. Returns `false` if it already was.
    pub fn disqualify(&mut self) -> bool {
        if self.disqualified {
            return false;
        }
        self.disqualified = true;
        true
    }

    /// Flip the bot-out flag and return the new value.
    pub fn toggle_bot_out(&mut self) -> bool {
        self.is_bot_out = !self.is_bot_out;
        self.is_bot_out
    }
}
