//! Timeout sub-machine.
//!
//! At most one timeout runs at a time. While it runs, elapsed time counts
//! up and two one-shot effects fire as it crosses their thresholds:
//!
//! 1. **Technical**: the opponent of the calling team gets +1.
//! 2. **Disqualification**: the calling team is disqualified and the
//!    timeout ends on its own.
//!
//! Thresholds fire on crossing, not on equality, so a coarse step that
//! jumps past a threshold still triggers it exactly once.

use crate::command::TeamId;
use crate::config::MatchConfig;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutState {
    pub running: bool,
    pub for_team: Option<TeamId>,
    pub elapsed: u32,
    /// One-shot latch for the technical point
    #[serde(skip)]
    technical_awarded: bool,
}

/// Side effects produced while a timeout runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutEffect {
    /// `awarded_to` receives a technical point
    TechnicalPoint { awarded_to: TeamId, threshold: u32 },
    /// `team` is disqualified; the timeout has been cleared
    Disqualified { team: TeamId, elapsed: u32 },
}

/// How far a running timeout has gone past its allowance
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TimeoutSeverity {
    Within,
    Overrun,
    Technical,
}

impl TimeoutState {
    pub fn start(&mut self, team: TeamId) {
        *self = TimeoutState {
            running: true,
            for_team: Some(team),
            elapsed: 0,
            technical_awarded: false,
        };
    }

    /// Clear the timeout, returning how long it ran.
    pub fn end(&mut self) -> u32 {
        let elapsed = self.elapsed;
        *self = TimeoutState::default();
        elapsed
    }

    /// Advance a running timeout and collect any threshold effects.
    pub fn advance(&mut self, seconds: u32, config: &MatchConfig) -> Vec<TimeoutEffect> {
        let mut effects = Vec::new();
        let team = match (self.running, self.for_team) {
            (true, Some(team)) => team,
            _ => return effects,
        };

        self.elapsed = self.elapsed.saturating_add(seconds);

        if !self.technical_awarded && self.elapsed >= config.technical_threshold_seconds {
            self.technical_awarded = true;
            effects.push(TimeoutEffect::TechnicalPoint {
                awarded_to: team.opposite(),
                threshold: config.technical_threshold_seconds,
            });
        }

        if self.elapsed >= config.disqualification_threshold_seconds {
            let elapsed = self.end();
            effects.push(TimeoutEffect::Disqualified { team, elapsed });
        }

        effects
    }

    pub fn severity(&self, config: &MatchConfig) -> TimeoutSeverity {
        if self.elapsed >= config.technical_threshold_seconds {
            TimeoutSeverity::Technical
        } else if self.elapsed > config.timeout_allowed_seconds {
            TimeoutSeverity::Overrun
        } else {
            TimeoutSeverity::Within
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_for(team: TeamId) -> TimeoutState {
        let mut state = TimeoutState::default();
        state.start(team);
        state
    }

    #[test]
    fn test_idle_timeout_ignores_ticks() {
        let config = MatchConfig::default();
        let mut state = TimeoutState::default();
        assert!(state.advance(100, &config).is_empty());
        assert_eq!(state.elapsed, 0);
    }

    #[test]
    fn test_technical_fires_once() {
        let config = MatchConfig::default();
        let mut state = running_for(TeamId::A);

        let mut fired = Vec::new();
        for _ in 0..60 {
            fired.extend(state.advance(1, &config));
        }
        assert_eq!(
            fired,
            vec![TimeoutEffect::TechnicalPoint { awarded_to: TeamId::B, threshold: 45 }]
        );
        assert!(state.running);
        assert_eq!(state.elapsed, 60);
    }

    #[test]
    fn test_disqualification_ends_timeout() {
        let config = MatchConfig::default();
        let mut state = running_for(TeamId::B);
        state.advance(89, &config);
        assert!(state.running);

        let effects = state.advance(1, &config);
        assert_eq!(effects, vec![TimeoutEffect::Disqualified { team: TeamId::B, elapsed: 90 }]);
        assert_eq!(state, TimeoutState::default());
    }

    #[test]
    fn test_coarse_step_crosses_both_thresholds() {
        let config = MatchConfig::default();
        let mut state = running_for(TeamId::A);
        let effects = state.advance(100, &config);
        assert_eq!(
            effects,
            vec![
                TimeoutEffect::TechnicalPoint { awarded_to: TeamId::B, threshold: 45 },
                TimeoutEffect::Disqualified { team: TeamId::A, elapsed: 100 },
            ]
        );
        assert!(!state.running);
    }

    #[test]
    fn test_skipped_technical_value_still_fires() {
        let config = MatchConfig::default();
        let mut state = running_for(TeamId::A);
        state.advance(44, &config);
        let effects = state.advance(2, &config);
        assert_eq!(effects.len(), 1);
        assert!(state.advance(2, &config).is_empty());
    }

    #[test]
    fn test_severity() {
        let config = MatchConfig::default();
        let mut state = running_for(TeamId::A);
        assert_eq!(state.severity(&config), TimeoutSeverity::Within);
        state.advance(30, &config);
        assert_eq!(state.severity(&config), TimeoutSeverity::Within);
        state.advance(1, &config);
        assert_eq!(state.severity(&config), TimeoutSeverity::Overrun);
        state.advance(14, &config);
        assert_eq!(state.severity(&config), TimeoutSeverity::Technical);
    }
}
