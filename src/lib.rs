//! # Robo-Ref
//!
//! A deterministic officiating engine for two-half robot-soccer matches.
//!
//! ## Design Principles
//!
//! - **Single Owner**: One `MatchEngine` owns phase, clocks, teams and log
//! - **Commands In, Snapshots Out**: Consumers never mutate state directly
//! - **Injected Time**: The engine never reads a timer; a driver calls `tick`
//! - **Latched Penalties**: Technical points and disqualifications fire once
//!
//! ## Architecture
//!
//! ```text
//! [Console / Replay] --Command--> [Engine] --MatchSnapshot--> [Panels]
//!                                     ^   \
//!                         [TickSource 1 Hz] --MatchResult--> [ResultSink]
//! ```

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod log;
pub mod team;
pub mod timeout;
pub mod stoppage;
pub mod match_engine;
pub mod snapshot;
pub mod publish;
pub mod engine;
pub mod script;
#[cfg(feature = "runtime")]
pub mod driver;

// Re-exports for convenience
pub use clock::fmt_clock;
pub use command::{Command, StoppageReason, TeamId};
pub use config::MatchConfig;
pub use error::{CommandError, ConfigError};
pub use match_engine::{MatchEngine, Phase};
pub use snapshot::{MatchResult, MatchSnapshot};
pub use publish::{JsonFileSink, ResultSink};
pub use engine::Engine;
