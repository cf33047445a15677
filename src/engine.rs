//! Engine - command front door.
//!
//! Wraps the match state machine with command dispatch and the publish
//! sink. This is the entry point for drivers, replays and tests.

use crate::command::Command;
use crate::config::MatchConfig;
use crate::error::CommandError;
use crate::log::WallClock;
use crate::match_engine::MatchEngine;
use crate::publish::ResultSink;
use crate::snapshot::{MatchResult, MatchSnapshot};
use tracing::{debug, trace};

/// The officiating engine for one match.
pub struct Engine {
    /// The underlying state machine
    pub referee: MatchEngine,
    sink: Option<Box<dyn ResultSink + Send>>,
}

impl Engine {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            referee: MatchEngine::new(config),
            sink: None,
        }
    }

    /// Engine whose log entries are stamped by `wall_clock`.
    pub fn with_wall_clock(config: MatchConfig, wall_clock: WallClock) -> Self {
        Self {
            referee: MatchEngine::with_wall_clock(config, wall_clock),
            sink: None,
        }
    }

    /// Attach the collaborator that receives published results.
    pub fn with_sink(mut self, sink: impl ResultSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Apply one command.
    ///
    /// A rejected command leaves the match exactly as it was.
    pub fn process_command(&mut self, cmd: Command) -> Result<(), CommandError> {
        let name = cmd.name();
        let outcome = match cmd {
            Command::StartMatch => self.referee.start_match(),
            Command::BeginSecondHalf => self.referee.begin_second_half(),
            Command::ToggleClock => self.referee.toggle_clock(),
            Command::ResetMatch => {
                self.referee.reset_match();
                Ok(())
            }
            Command::CallTimeout(team) => self.referee.call_timeout(team),
            Command::EndTimeout => self.referee.end_timeout(),
            Command::StartStoppage(reason) => self.referee.start_stoppage(reason),
            Command::EndStoppage => self.referee.end_stoppage(),
            Command::Goal(team) => {
                self.referee.goal(team);
                Ok(())
            }
            Command::EarlyStartFoul(team) => {
                self.referee.early_start_foul(team);
                Ok(())
            }
            Command::TechnicalPoint(team) => {
                self.referee.technical_point(team);
                Ok(())
            }
            Command::AdjustScore { team, delta, reason } => {
                self.referee.adjust_score(team, delta, &reason);
                Ok(())
            }
            Command::ToggleBotOut(team) => {
                self.referee.toggle_bot_out(team);
                Ok(())
            }
            Command::RenameTeam { team, name } => {
                self.referee.rename_team(team, name);
                Ok(())
            }
            Command::PublishResult => self.publish_result().map(|_| ()),
        };

        match &outcome {
            Ok(()) => trace!(command = name, "command applied"),
            Err(err) => debug!(command = name, %err, "command rejected"),
        }
        outcome
    }

    /// Publish the final result to the sink, once per call.
    pub fn publish_result(&mut self) -> Result<MatchResult, CommandError> {
        let result = self.referee.publish_result()?;
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&result);
        }
        Ok(result)
    }

    /// One second of match time.
    #[inline]
    pub fn tick(&mut self) {
        self.referee.tick();
    }

    #[inline]
    pub fn advance(&mut self, seconds: u32) {
        self.referee.advance(seconds);
    }

    #[inline]
    pub fn needs_tick(&self) -> bool {
        self.referee.needs_tick()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        self.referee.snapshot()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.referee.state_hash()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("referee", &self.referee)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
