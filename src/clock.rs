//! Clock display and countdowns.

use serde::Serialize;

/// Format seconds as `m:ss`.
///
/// Used for every duration that is logged or shown, so the output must stay
/// stable: `90 -> "1:30"`, `5 -> "0:05"`.
pub fn fmt_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// A countdown that floors at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub const fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    #[inline]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    #[inline]
    pub const fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Count down by `seconds`, clamping at zero.
    ///
    /// Returns `true` only on the step that brings the countdown to zero.
    pub fn count_down(&mut self, seconds: u32) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(seconds);
        self.remaining == 0
    }

    pub fn reset(&mut self, seconds: u32) {
        self.remaining = seconds;
    }
}
