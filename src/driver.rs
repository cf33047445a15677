//! Tick Source and live driver.
//!
//! The driver owns the [`Engine`] on a tokio task. Officials' commands come
//! in over a channel; every change goes out as a fresh [`MatchSnapshot`] on
//! a watch channel.
//!
//! ```text
//! [Console] --Command--> [Driver task] --MatchSnapshot--> [Console]
//!                             ^
//!                       [TickSource 1 Hz]
//! ```
//!
//! The one-second interval is attached only while the engine has a live
//! countdown and dropped as soon as it has none. Re-attaching starts a fresh
//! one-second phase, so a resumed clock never fires early or twice.

use crate::command::Command;
use crate::engine::Engine;
use crate::error::CommandError;
use crate::snapshot::MatchSnapshot;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Cadence of the match clock
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A one-second interval that can be attached and detached.
#[derive(Debug)]
pub struct TickSource {
    period: Duration,
    interval: Option<Interval>,
}

impl TickSource {
    pub fn new(period: Duration) -> Self {
        Self { period, interval: None }
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Attach or detach so the source runs exactly while `wanted`.
    pub fn sync(&mut self, wanted: bool) {
        match (wanted, self.interval.is_some()) {
            (true, false) => {
                let mut interval = time::interval_at(Instant::now() + self.period, self.period);
                // A late wake-up fires the missed ticks back to back; no second is dropped
                interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
                self.interval = Some(interval);
                debug!("tick source attached");
            }
            (false, true) => {
                self.interval = None;
                debug!("tick source detached");
            }
            _ => {}
        }
    }

    /// Resolve on the next tick; never resolves while detached.
    pub async fn fire(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// The console's side of a running driver
#[derive(Debug)]
pub struct ConsoleHandle {
    pub commands: mpsc::UnboundedSender<Command>,
    pub snapshots: watch::Receiver<MatchSnapshot>,
    /// Rejections the official should see
    pub notices: mpsc::UnboundedReceiver<CommandError>,
}

/// The engine side of a running driver
#[derive(Debug)]
pub struct Driver {
    engine: Engine,
    ticks: TickSource,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<MatchSnapshot>,
    notices: mpsc::UnboundedSender<CommandError>,
}

/// Wire an engine to a new console handle.
pub fn console(engine: Engine) -> (ConsoleHandle, Driver) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();

    let handle = ConsoleHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        notices: notice_rx,
    };
    let driver = Driver {
        engine,
        ticks: TickSource::new(TICK_PERIOD),
        commands: command_rx,
        snapshots: snapshot_tx,
        notices: notice_tx,
    };
    (handle, driver)
}

impl Driver {
    /// Run until every command sender is dropped, then hand the engine back.
    pub async fn run(mut self) -> Engine {
        info!("match driver started");
        loop {
            self.ticks.sync(self.engine.needs_tick());

            tokio::select! {
                received = self.commands.recv() => {
                    let Some(cmd) = received else { break };
                    if let Err(err) = self.engine.process_command(cmd) {
                        if err.is_user_notice() {
                            let _ = self.notices.send(err);
                        }
                    }
                }
                _ = self.ticks.fire() => self.engine.tick(),
            }

            self.snapshots.send_replace(self.engine.snapshot());
        }
        info!("match driver stopped");
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::TeamId;
    use crate::match_engine::Phase;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_source_follows_clock() {
        let (mut handle, driver) = console(Engine::default());
        let task = tokio::spawn(driver.run());

        handle.commands.send(Command::StartMatch).unwrap();
        time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handle.snapshots.borrow().half_remaining, 80);

        // Paused: nothing moves
        handle.commands.send(Command::ToggleClock).unwrap();
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.snapshots.borrow().half_remaining, 80);

        handle.commands.send(Command::ToggleClock).unwrap();
        time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(handle.snapshots.borrow_and_update().half_remaining, 75);

        drop(handle.commands);
        let engine = task.await.unwrap();
        assert_eq!(engine.referee.phase(), Phase::FirstHalf);
        assert!(handle.notices.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_runs_on_its_own_ticks() {
        let (handle, driver) = console(Engine::default());
        let task = tokio::spawn(driver.run());

        handle.commands.send(Command::StartMatch).unwrap();
        handle.commands.send(Command::CallTimeout(TeamId::A)).unwrap();
        time::sleep(Duration::from_millis(45_500)).await;

        let snap = handle.snapshots.borrow().clone();
        assert_eq!(snap.half_remaining, 90);
        assert_eq!(snap.timeout.elapsed, 45);
        assert_eq!(snap.team(TeamId::B).score, 1);

        drop(handle);
        let engine = task.await.unwrap();
        assert!(engine.referee.timeout().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_before_full_time_is_a_notice() {
        let (mut handle, driver) = console(Engine::default());
        let task = tokio::spawn(driver.run());

        handle.commands.send(Command::EndTimeout).unwrap();
        handle.commands.send(Command::PublishResult).unwrap();
        settle().await;

        assert_eq!(handle.notices.recv().await, Some(CommandError::MatchNotEnded));
        assert!(handle.notices.try_recv().is_err());

        drop(handle.commands);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_when_idle() {
        let mut ticks = TickSource::new(TICK_PERIOD);
        ticks.sync(false);
        assert!(!ticks.is_armed());
        ticks.sync(true);
        assert!(ticks.is_armed());
        ticks.fire().await;
        ticks.sync(false);
        assert!(!ticks.is_armed());
    }
}
