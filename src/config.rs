//! Match configuration.
//!
//! All durations are whole seconds. The defaults are the league's standard
//! format: two 1:30 halves, a 1:30 break, and a timeout that turns into a
//! technical point at 0:45 and a disqualification at 1:30.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of halves in a match. The phase machine is built around two.
pub const HALVES: u32 = 2;

/// Timeouts each team may call per match
pub const TIMEOUTS_PER_TEAM: u8 = 1;

/// Longest half whose regulation total still fits a `u32` of seconds
pub const MAX_HALF_SECONDS: u32 = u32::MAX / HALVES;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Playing time per half
    pub half_seconds: u32,
    /// Break between the halves
    pub half_time_seconds: u32,
    /// Nominal timeout length; past this the timeout is overrunning
    pub timeout_allowed_seconds: u32,
    /// Timeout length at which the opponent gets a technical point
    pub technical_threshold_seconds: u32,
    /// Timeout length at which the calling team is disqualified
    pub disqualification_threshold_seconds: u32,
    /// Names given to the teams at start-up and on every reset
    pub team_names: [String; 2],
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            half_seconds: 90,
            half_time_seconds: 90,
            timeout_allowed_seconds: 30,
            technical_threshold_seconds: 45,
            disqualification_threshold_seconds: 90,
            team_names: ["Team A".to_string(), "Team B".to_string()],
        }
    }
}

impl MatchConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.half_seconds == 0 {
            return Err(ConfigError::Validation("half_seconds must be positive".into()));
        }
        if self.half_seconds > MAX_HALF_SECONDS {
            return Err(ConfigError::Validation(format!(
                "half_seconds ({}) exceeds the maximum of {}",
                self.half_seconds, MAX_HALF_SECONDS
            )));
        }
        if self.timeout_allowed_seconds > self.technical_threshold_seconds {
            return Err(ConfigError::Validation(format!(
                "timeout_allowed_seconds ({}) exceeds technical_threshold_seconds ({})",
                self.timeout_allowed_seconds, self.technical_threshold_seconds
            )));
        }
        if self.technical_threshold_seconds >= self.disqualification_threshold_seconds {
            return Err(ConfigError::Validation(format!(
                "technical_threshold_seconds ({}) must be below disqualification_threshold_seconds ({})",
                self.technical_threshold_seconds, self.disqualification_threshold_seconds
            )));
        }
        Ok(())
    }

    /// Full regulation time across both halves
    #[inline]
    pub fn regulation_seconds(&self) -> u32 {
        HALVES.saturating_mul(self.half_seconds)
    }
}
