//! Officiating scripts: timed command lists stored as CSV.
//!
//! ```text
//! at,command,team,value,reason
//! 0,start-match,,,
//! 12,goal,0,,
//! 30,call-timeout,1,,
//! 41,adjust-score,0,-2,Crossed centre line
//! ```
//!
//! `at` is match-session time in whole seconds since the script started.
//! Rows must be in non-decreasing `at` order. Lines starting with `#` are
//! comments.

use crate::command::{Command, StoppageReason, TeamId, MANUAL_ADJUST_REASON};
use crate::engine::Engine;
use crate::error::CommandError;
use serde::Deserialize;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Upper bound on ticks spent running a script's clock out
pub const RUN_OUT_LIMIT: u32 = 24 * 60 * 60;

#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unknown command '{name}'")]
    UnknownCommand { line: u64, name: String },
    #[error("line {line}: {command} needs a team (0 or 1)")]
    MissingTeam { line: u64, command: String },
    #[error("line {line}: team must be 0 or 1, got {team}")]
    BadTeam { line: u64, team: u8 },
    #[error("line {line}: {command} needs a value")]
    MissingValue { line: u64, command: String },
    #[error("line {line}: {message}")]
    BadValue { line: u64, message: String },
    #[error("line {line}: at={at} is earlier than the previous row (at={previous})")]
    OutOfOrder { line: u64, at: u32, previous: u32 },
}

/// One raw CSV row
#[derive(Debug, Deserialize)]
pub struct ScriptRow {
    pub at: u32,
    pub command: String,
    pub team: Option<u8>,
    pub value: Option<String>,
    pub reason: Option<String>,
}

/// A command scheduled at a session second
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptStep {
    pub line: u64,
    pub at: u32,
    pub command: Command,
}

impl ScriptRow {
    /// Convert the raw row to a typed command.
    pub fn to_command(&self, line: u64) -> Result<Command, ScriptError> {
        let name = self.command.trim().to_ascii_lowercase();

        let command = match name.as_str() {
            "start-match" => Command::StartMatch,
            "begin-second-half" => Command::BeginSecondHalf,
            "toggle-clock" => Command::ToggleClock,
            "reset-match" => Command::ResetMatch,
            "call-timeout" => Command::CallTimeout(self.team_id(line, &name)?),
            "end-timeout" => Command::EndTimeout,
            "start-stoppage" => {
                let reason: StoppageReason = self.value_str(line, &name)?
                    .parse()
                    .map_err(|message| ScriptError::BadValue { line, message })?;
                Command::StartStoppage(reason)
            }
            "end-stoppage" => Command::EndStoppage,
            "goal" => Command::Goal(self.team_id(line, &name)?),
            "early-start-foul" => Command::EarlyStartFoul(self.team_id(line, &name)?),
            "technical-point" => Command::TechnicalPoint(self.team_id(line, &name)?),
            "adjust-score" => {
                let raw = self.value_str(line, &name)?;
                let delta: i32 = raw.parse().map_err(|_| ScriptError::BadValue {
                    line,
                    message: format!("score delta must be an integer, got '{raw}'"),
                })?;
                let reason = self
                    .reason
                    .clone()
                    .unwrap_or_else(|| MANUAL_ADJUST_REASON.to_string());
                Command::AdjustScore { team: self.team_id(line, &name)?, delta, reason }
            }
            "toggle-bot-out" => Command::ToggleBotOut(self.team_id(line, &name)?),
            "rename-team" => Command::RenameTeam {
                team: self.team_id(line, &name)?,
                name: self.value_str(line, &name)?.to_string(),
            },
            "publish-result" => Command::PublishResult,
            _ => return Err(ScriptError::UnknownCommand { line, name }),
        };
        Ok(command)
    }

    fn team_id(&self, line: u64, command: &str) -> Result<TeamId, ScriptError> {
        let raw = self.team.ok_or_else(|| ScriptError::MissingTeam {
            line,
            command: command.to_string(),
        })?;
        TeamId::try_from(raw).map_err(|_| ScriptError::BadTeam { line, team: raw })
    }

    fn value_str(&self, line: u64, command: &str) -> Result<&str, ScriptError> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ScriptError::MissingValue {
                line,
                command: command.to_string(),
            })
    }
}

/// Parse a script from any CSV source.
pub fn read_script<R: io::Read>(reader: R) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut steps = Vec::new();
    let mut previous = 0u32;
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let row: ScriptRow = record.deserialize(Some(&headers))?;
        if row.at < previous {
            return Err(ScriptError::OutOfOrder { line, at: row.at, previous });
        }
        previous = row.at;
        steps.push(ScriptStep {
            line,
            at: row.at,
            command: row.to_command(line)?,
        });
    }
    Ok(steps)
}

pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptStep>, ScriptError> {
    let file = std::fs::File::open(path)?;
    read_script(io::BufReader::new(file))
}

/// What happened while replaying a script
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Commands the engine accepted
    pub applied: usize,
    /// Commands the engine rejected, with their script line
    pub rejected: Vec<(u64, CommandError)>,
    /// Session seconds ticked
    pub elapsed: u32,
}

/// Drive an engine through a script, one tick per session second.
///
/// With `run_out`, keeps ticking after the last row until no countdown is
/// live (bounded by [`RUN_OUT_LIMIT`]).
pub fn replay(engine: &mut Engine, steps: &[ScriptStep], run_out: bool) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();

    for step in steps {
        while outcome.elapsed < step.at {
            engine.tick();
            outcome.elapsed += 1;
        }
        match engine.process_command(step.command.clone()) {
            Ok(()) => outcome.applied += 1,
            Err(err) => {
                warn!(line = step.line, command = step.command.name(), %err, "script command rejected");
                outcome.rejected.push((step.line, err));
            }
        }
    }

    if run_out {
        let mut spent = 0;
        while engine.needs_tick() && spent < RUN_OUT_LIMIT {
            engine.tick();
            spent += 1;
        }
        outcome.elapsed += spent;
        debug!(spent, "clock run out");
    }

    outcome
}
