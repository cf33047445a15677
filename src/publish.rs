//! Publish callback for final results.
//!
//! The engine hands each successful publish to exactly one sink. What the
//! sink does with it (leaderboard submission, a file, stdout) is its own
//! business; failures there never touch match state.

use crate::snapshot::MatchResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info};

/// Receiver of published results
pub trait ResultSink {
    fn publish(&mut self, result: &MatchResult);
}

impl<F> ResultSink for F
where
    F: FnMut(&MatchResult),
{
    fn publish(&mut self, result: &MatchResult) {
        self(result)
    }
}

/// Writes each published result as pretty JSON, replacing the file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write(&self, result: &MatchResult) -> anyhow::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, result)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl ResultSink for JsonFileSink {
    fn publish(&mut self, result: &MatchResult) {
        // Best effort: the officials still have the console on screen
        match self.write(result) {
            Ok(()) => info!(path = %self.path.display(), "result published"),
            Err(err) => error!(path = %self.path.display(), %err, "failed to write result"),
        }
    }
}
