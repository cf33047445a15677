//! Stoppage sub-machine. Counts up while running; no escalation.

use crate::command::StoppageReason;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StoppageState {
    pub running: bool,
    pub reason: Option<StoppageReason>,
    pub elapsed: u32,
}

impl StoppageState {
    pub fn start(&mut self, reason: StoppageReason) {
        *self = StoppageState {
            running: true,
            reason: Some(reason),
            elapsed: 0,
        };
    }

    /// Clear the stoppage, returning how long it ran.
    pub fn end(&mut self) -> u32 {
        let elapsed = self.elapsed;
        *self = StoppageState::default();
        elapsed
    }

    pub fn advance(&mut self, seconds: u32) {
        if self.running {
            self.elapsed = self.elapsed.saturating_add(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stoppage_counts_only_while_running() {
        let mut s = StoppageState::default();
        s.advance(5);
        assert_eq!(s.elapsed, 0);

        s.start(StoppageReason::BotsStuck);
        s.advance(1);
        s.advance(11);
        assert_eq!(s.elapsed, 12);
        assert_eq!(s.reason, Some(StoppageReason::BotsStuck));

        assert_eq!(s.end(), 12);
        assert_eq!(s, StoppageState::default());
    }
}
