//! Match Engine - phase state machine and timing.
//!
//! Owns every piece of outcome-relevant state: phase, half clock, half-time
//! clock, both teams, the timeout and stoppage sub-machines, and the event
//! log. All mutation goes through the command methods or [`MatchEngine::advance`].
//!
//! ```text
//! PRE_MATCH --start--> FIRST_HALF --expiry--> HALF_TIME --begin--> SECOND_HALF --expiry--> ENDED
//!     ^                                                                                     |
//!     +------------------------------------- reset -----------------------------------------+
//! ```
//!
//! Each second of match time is one composite step evaluated in a fixed order:
//! half clock, timeout, stoppage, half-time clock.

use crate::clock::{fmt_clock, Countdown};
use crate::command::{
    StoppageReason, TeamId, EARLY_START_FOUL_REASON, GOAL_REASON, TECHNICAL_POINT_REASON,
};
use crate::config::MatchConfig;
use crate::error::CommandError;
use crate::log::{local_time, EventLog, WallClock};
use crate::snapshot::{decide_winner, MatchResult, MatchSnapshot};
use crate::stoppage::StoppageState;
use crate::team::Team;
use crate::timeout::{TimeoutEffect, TimeoutSeverity, TimeoutState};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, trace};

/// Top-level stage of the match. Only ever advances, except on reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    PreMatch,
    FirstHalf,
    HalfTime,
    SecondHalf,
    Ended,
}

impl Phase {
    /// Whether a half clock belongs to this phase
    #[inline]
    pub const fn is_half(self) -> bool {
        matches!(self, Phase::FirstHalf | Phase::SecondHalf)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Phase::PreMatch => "PRE-MATCH",
            Phase::FirstHalf => "1ST HALF",
            Phase::HalfTime => "HALF-TIME",
            Phase::SecondHalf => "2ND HALF",
            Phase::Ended => "ENDED",
        }
    }
}

/// The match state machine
#[derive(Clone, Debug)]
pub struct MatchEngine {
    config: MatchConfig,
    phase: Phase,
    /// 0 = first half, 1 = second half
    half_index: u8,
    half_clock: Countdown,
    half_time_clock: Countdown,
    /// Pause/resume flag for the half clock
    running: bool,
    teams: [Team; 2],
    timeout: TimeoutState,
    stoppage: StoppageState,
    log: EventLog,
    wall_clock: WallClock,
}

impl MatchEngine {
    /// Create an engine in PRE_MATCH, stamping log entries with local time.
    pub fn new(config: MatchConfig) -> Self {
        Self::with_wall_clock(config, local_time)
    }

    /// Create an engine with a custom log timestamp source.
    ///
    /// `config` must pass [`MatchConfig::validate`]; a zero-length half
    /// would never expire.
    pub fn with_wall_clock(config: MatchConfig, wall_clock: WallClock) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid match config: {config:?}");
        let teams = [
            Team::new(config.team_names[0].clone()),
            Team::new(config.team_names[1].clone()),
        ];
        Self {
            phase: Phase::PreMatch,
            half_index: 0,
            half_clock: Countdown::new(config.half_seconds),
            half_time_clock: Countdown::new(config.half_time_seconds),
            running: false,
            teams,
            timeout: TimeoutState::default(),
            stoppage: StoppageState::default(),
            log: EventLog::new(),
            wall_clock,
            config,
        }
    }

    // ========================================================================
    // Phase & half clock
    // ========================================================================

    /// Kick-off. Valid only in PRE_MATCH.
    pub fn start_match(&mut self) -> Result<(), CommandError> {
        self.require_phase("start-match", Phase::PreMatch)?;
        self.phase = Phase::FirstHalf;
        self.half_index = 0;
        self.half_clock.reset(self.config.half_seconds);
        self.running = true;
        info!(half_seconds = self.config.half_seconds, "first half started");
        self.push_log("Match started — First Half");
        Ok(())
    }

    /// Start the second half. Valid only in HALF_TIME, whatever the break clock shows.
    pub fn begin_second_half(&mut self) -> Result<(), CommandError> {
        self.require_phase("begin-second-half", Phase::HalfTime)?;
        self.phase = Phase::SecondHalf;
        self.half_index = 1;
        self.half_clock.reset(self.config.half_seconds);
        self.running = true;
        info!(
            break_remaining = self.half_time_clock.remaining(),
            "second half started"
        );
        self.push_log("Second Half started");
        Ok(())
    }

    /// Flip the pause/resume flag. The clock still only runs when
    /// [`clock_disabled`](Self::clock_disabled) is false.
    pub fn toggle_clock(&mut self) -> Result<(), CommandError> {
        if self.phase == Phase::Ended {
            return Err(CommandError::MatchEnded);
        }
        self.running = !self.running;
        debug!(running = self.running, "clock toggled");
        Ok(())
    }

    /// Back to PRE_MATCH with every team, clock and log at its default.
    pub fn reset_match(&mut self) {
        info!(from = ?self.phase, "match reset");
        *self = Self::with_wall_clock(self.config.clone(), self.wall_clock);
    }

    fn end_half(&mut self) {
        self.running = false;
        if self.half_index == 0 {
            self.phase = Phase::HalfTime;
            self.half_time_clock.reset(self.config.half_time_seconds);
            info!("first half expired");
            let text = format!(
                "End of First Half — Half-time interval begins ({})",
                fmt_clock(self.config.half_time_seconds)
            );
            self.push_log(text);
        } else {
            self.phase = Phase::Ended;
            info!(winner = ?self.winner(), "full time");
            self.push_log("Full time reached — Match ended");
        }
    }

    // ========================================================================
    // Timeout
    // ========================================================================

    /// Team-requested timeout. One per team per match, one at a time.
    pub fn call_timeout(&mut self, team: TeamId) -> Result<(), CommandError> {
        if self.phase == Phase::Ended {
            return Err(CommandError::MatchEnded);
        }
        if self.timeout.running {
            return Err(CommandError::TimeoutAlreadyRunning);
        }
        if !self.teams[team.index()].has_timeout_left() {
            return Err(CommandError::TimeoutAllotmentUsed(team));
        }

        self.running = false;
        self.timeout.start(team);
        self.teams[team.index()].use_timeout();
        info!(team = %team, "timeout called");
        let text = format!("{} called TIMEOUT", self.teams[team.index()].name);
        self.push_log(text);
        Ok(())
    }

    /// End the running timeout. Play resumes only on a later toggle.
    pub fn end_timeout(&mut self) -> Result<(), CommandError> {
        if !self.timeout.running {
            return Err(CommandError::NoTimeoutRunning);
        }
        let elapsed = self.timeout.end();
        self.push_log(format!("Timeout ended at {}", fmt_clock(elapsed)));
        Ok(())
    }

    fn apply_timeout_effect(&mut self, effect: TimeoutEffect) {
        match effect {
            TimeoutEffect::TechnicalPoint { awarded_to, threshold } => {
                let team = &mut self.teams[awarded_to.index()];
                team.adjust_score(1);
                info!(team = %awarded_to, "technical point for timeout overrun");
                let text = format!(
                    "Timeout exceeded {}. {} awarded +1 technical point.",
                    fmt_clock(threshold),
                    team.name
                );
                self.push_log(text);
            }
            TimeoutEffect::Disqualified { team: id, elapsed } => {
                let team = &mut self.teams[id.index()];
                if team.disqualify() {
                    info!(team = %id, elapsed, "team disqualified for timeout overrun");
                    let text = format!("Timeout reached {}. {} DISQUALIFIED.", fmt_clock(elapsed), team.name);
                    self.push_log(text);
                }
            }
        }
    }

    // ========================================================================
    // Stoppage
    // ========================================================================

    /// Official stoppage. One at a time; independent of any timeout.
    pub fn start_stoppage(&mut self, reason: StoppageReason) -> Result<(), CommandError> {
        if self.phase == Phase::Ended {
            return Err(CommandError::MatchEnded);
        }
        if self.stoppage.running {
            return Err(CommandError::StoppageAlreadyRunning);
        }
        self.running = false;
        self.stoppage.start(reason);
        info!(?reason, "stoppage started");
        self.push_log(format!("Stoppage: {}", reason.label()));
        Ok(())
    }

    /// End the running stoppage. Play resumes only on a later toggle.
    pub fn end_stoppage(&mut self) -> Result<(), CommandError> {
        if !self.stoppage.running {
            return Err(CommandError::NoStoppageRunning);
        }
        let elapsed = self.stoppage.end();
        self.push_log(format!(
            "Stoppage ended at {} — Restart from designated spot",
            fmt_clock(elapsed)
        ));
        Ok(())
    }

    // ========================================================================
    // Scoring
    // ========================================================================

    /// Apply `delta` to a team's score, flooring at zero. Logged when the
    /// delta is non-zero and a reason is given.
    pub fn adjust_score(&mut self, team: TeamId, delta: i32, reason: &str) {
        let record = &mut self.teams[team.index()];
        let score = record.adjust_score(delta);
        debug!(team = %team, delta, score, "score adjusted");
        if delta != 0 && !reason.is_empty() {
            let signed = if delta > 0 { format!("+{delta}") } else { delta.to_string() };
            let text = format!("{} {} ({})", record.name, signed, reason);
            self.push_log(text);
        }
    }

    pub fn goal(&mut self, team: TeamId) {
        self.adjust_score(team, 1, GOAL_REASON);
    }

    pub fn early_start_foul(&mut self, team: TeamId) {
        self.adjust_score(team, -1, EARLY_START_FOUL_REASON);
    }

    /// Official-awarded technical point, independent of the timeout rule.
    pub fn technical_point(&mut self, team: TeamId) {
        self.adjust_score(team, 1, TECHNICAL_POINT_REASON);
    }

    /// Advisory only: no effect on score, clock or phase.
    pub fn toggle_bot_out(&mut self, team: TeamId) {
        let record = &mut self.teams[team.index()];
        let out = record.toggle_bot_out();
        let text = if out {
            format!("{} bot declared BOT OUT", record.name)
        } else {
            format!("{} bot returned", record.name)
        };
        self.push_log(text);
    }

    pub fn rename_team(&mut self, team: TeamId, name: impl Into<String>) {
        self.teams[team.index()].name = name.into();
    }

    // ========================================================================
    // Result
    // ========================================================================

    /// Winner, decided only once the match has ended
    pub fn winner(&self) -> Option<TeamId> {
        if self.phase != Phase::Ended {
            return None;
        }
        decide_winner(&self.teams)
    }

    /// Capture the final result. Rejected before full time; never mutates.
    pub fn publish_result(&self) -> Result<MatchResult, CommandError> {
        if self.phase != Phase::Ended {
            return Err(CommandError::MatchNotEnded);
        }
        Ok(MatchResult {
            teams: self.teams.clone(),
            winner: self.winner(),
            log: self.log.rendered(),
        })
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// One second of match time.
    #[inline]
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Advance every active countdown by `seconds`.
    ///
    /// Order: (a) half clock, (b) timeout, (c) stoppage, (d) half-time clock.
    /// The half-time clock only counts if the step began in HALF_TIME, so
    /// the step that ends the first half does not eat into the break.
    /// Time left over when a half expires mid-step is discarded.
    pub fn advance(&mut self, seconds: u32) {
        if seconds == 0 {
            return;
        }
        let in_break = self.phase == Phase::HalfTime;

        if self.half_clock_active() && self.half_clock.count_down(seconds) {
            self.end_half();
        }

        let effects = self.timeout.advance(seconds, &self.config);
        for effect in effects {
            self.apply_timeout_effect(effect);
        }

        self.stoppage.advance(seconds);

        if in_break {
            self.half_time_clock.count_down(seconds);
        }

        trace!(
            phase = ?self.phase,
            half_remaining = self.half_clock.remaining(),
            timeout_elapsed = self.timeout.elapsed,
            stoppage_elapsed = self.stoppage.elapsed,
            "tick"
        );
    }

    // ========================================================================
    // Derived state
    // ========================================================================

    /// Half clock is held regardless of the running flag
    #[inline]
    pub fn clock_disabled(&self) -> bool {
        self.timeout.running
            || self.stoppage.running
            || matches!(self.phase, Phase::HalfTime | Phase::Ended)
    }

    /// Half clock counts down on the next tick
    #[inline]
    pub fn half_clock_active(&self) -> bool {
        self.running && self.phase.is_half() && !self.clock_disabled()
    }

    /// Whether any countdown would move on the next tick. A tick source
    /// should be attached exactly while this holds.
    pub fn needs_tick(&self) -> bool {
        self.half_clock_active()
            || self.timeout.running
            || self.stoppage.running
            || (self.phase == Phase::HalfTime && !self.half_time_clock.is_expired())
    }

    pub fn total_played(&self) -> u32 {
        u32::from(self.half_index)
            .saturating_mul(self.config.half_seconds)
            .saturating_add(self.config.half_seconds - self.half_clock.remaining())
    }

    pub fn total_remaining(&self) -> u32 {
        self.config.regulation_seconds().saturating_sub(self.total_played())
    }

    pub fn timeout_severity(&self) -> Option<TimeoutSeverity> {
        self.timeout
            .running
            .then(|| self.timeout.severity(&self.config))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn half_index(&self) -> u8 {
        self.half_index
    }

    pub fn half_remaining(&self) -> u32 {
        self.half_clock.remaining()
    }

    pub fn half_time_remaining(&self) -> u32 {
        self.half_time_clock.remaining()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn team(&self, team: TeamId) -> &Team {
        &self.teams[team.index()]
    }

    pub fn teams(&self) -> &[Team; 2] {
        &self.teams
    }

    pub fn timeout(&self) -> &TimeoutState {
        &self.timeout
    }

    pub fn stoppage(&self) -> &StoppageState {
        &self.stoppage
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            phase: self.phase,
            half_index: self.half_index,
            half_remaining: self.half_clock.remaining(),
            half_time_remaining: self.half_time_clock.remaining(),
            running: self.running,
            clock_disabled: self.clock_disabled(),
            teams: self.teams.clone(),
            timeout: self.timeout,
            timeout_severity: self.timeout_severity(),
            stoppage: self.stoppage,
            log: self.log.iter().cloned().collect(),
            total_played: self.total_played(),
            total_remaining: self.total_remaining(),
            winner: self.winner(),
        }
    }

    /// Hash of all outcome-relevant state plus log texts (not timestamps).
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.phase.hash(&mut hasher);
        self.half_index.hash(&mut hasher);
        self.half_clock.hash(&mut hasher);
        self.half_time_clock.hash(&mut hasher);
        self.running.hash(&mut hasher);
        self.teams.hash(&mut hasher);
        self.timeout.hash(&mut hasher);
        self.stoppage.hash(&mut hasher);
        for text in self.log.texts() {
            text.hash(&mut hasher);
        }
        hasher.finish()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require_phase(&self, command: &'static str, expected: Phase) -> Result<(), CommandError> {
        if self.phase != expected {
            return Err(CommandError::WrongPhase {
                command,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn push_log(&mut self, text: impl Into<String>) {
        let at = (self.wall_clock)();
        self.log.push(at, text);
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
