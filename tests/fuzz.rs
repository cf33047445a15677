//! Fuzz Test - Compares Robo-Ref against a reference implementation.
//!
//! Uses a naive, second-by-second reference model of the match rules to
//! verify the engine produces identical observable state after every step.

use robo_ref::{Command, Engine, MatchConfig, Phase, StoppageReason, TeamId};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const HALF: u32 = 90;
const BREAK: u32 = 90;
const TECHNICAL: u32 = 45;
const DQ: u32 = 90;

/// Simple reference implementation for verification
struct ReferenceMatch {
    phase: Phase,
    second_half: bool,
    remaining: u32,
    break_remaining: u32,
    running: bool,
    scores: [u32; 2],
    timeouts_used: [u8; 2],
    disqualified: [bool; 2],
    bot_out: [bool; 2],
    timeout_team: Option<usize>,
    timeout_elapsed: u32,
    technical_done: bool,
    stoppage: Option<u32>,
}

impl ReferenceMatch {
    fn new() -> Self {
        Self {
            phase: Phase::PreMatch,
            second_half: false,
            remaining: HALF,
            break_remaining: BREAK,
            running: false,
            scores: [0; 2],
            timeouts_used: [0; 2],
            disqualified: [false; 2],
            bot_out: [false; 2],
            timeout_team: None,
            timeout_elapsed: 0,
            technical_done: false,
            stoppage: None,
        }
    }

    fn add_score(&mut self, team: usize, delta: i32) {
        let next = self.scores[team] as i64 + delta as i64;
        self.scores[team] = next.max(0) as u32;
    }

    /// Returns whether the command was accepted
    fn apply(&mut self, cmd: &Command) -> bool {
        match cmd {
            Command::StartMatch => {
                if self.phase != Phase::PreMatch {
                    return false;
                }
                self.phase = Phase::FirstHalf;
                self.remaining = HALF;
                self.running = true;
            }
            Command::BeginSecondHalf => {
                if self.phase != Phase::HalfTime {
                    return false;
                }
                self.phase = Phase::SecondHalf;
                self.second_half = true;
                self.remaining = HALF;
                self.running = true;
            }
            Command::ToggleClock => {
                if self.phase == Phase::Ended {
                    return false;
                }
                self.running = !self.running;
            }
            Command::ResetMatch => *self = Self::new(),
            Command::CallTimeout(team) => {
                let t = team.index();
                if self.phase == Phase::Ended
                    || self.timeout_team.is_some()
                    || self.timeouts_used[t] >= 1
                {
                    return false;
                }
                self.running = false;
                self.timeout_team = Some(t);
                self.timeout_elapsed = 0;
                self.technical_done = false;
                self.timeouts_used[t] += 1;
            }
            Command::EndTimeout => {
                if self.timeout_team.is_none() {
                    return false;
                }
                self.timeout_team = None;
                self.timeout_elapsed = 0;
            }
            Command::StartStoppage(_) => {
                if self.phase == Phase::Ended || self.stoppage.is_some() {
                    return false;
                }
                self.running = false;
                self.stoppage = Some(0);
            }
            Command::EndStoppage => {
                if self.stoppage.is_none() {
                    return false;
                }
                self.stoppage = None;
            }
            Command::Goal(team) => self.add_score(team.index(), 1),
            Command::EarlyStartFoul(team) => self.add_score(team.index(), -1),
            Command::TechnicalPoint(team) => self.add_score(team.index(), 1),
            Command::AdjustScore { team, delta, .. } => self.add_score(team.index(), *delta),
            Command::ToggleBotOut(team) => {
                let t = team.index();
                self.bot_out[t] = !self.bot_out[t];
            }
            Command::RenameTeam { .. } => {}
            Command::PublishResult => return self.phase == Phase::Ended,
        }
        true
    }

    /// Exactly one second
    fn tick(&mut self) {
        let in_break = self.phase == Phase::HalfTime;
        let halted = self.timeout_team.is_some() || self.stoppage.is_some();

        if self.running && !halted && matches!(self.phase, Phase::FirstHalf | Phase::SecondHalf) {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.running = false;
                if self.second_half {
                    self.phase = Phase::Ended;
                } else {
                    self.phase = Phase::HalfTime;
                    self.break_remaining = BREAK;
                }
            }
        }

        if let Some(t) = self.timeout_team {
            self.timeout_elapsed += 1;
            if self.timeout_elapsed == TECHNICAL && !self.technical_done {
                self.technical_done = true;
                self.scores[1 - t] += 1;
            }
            if self.timeout_elapsed == DQ {
                self.disqualified[t] = true;
                self.timeout_team = None;
                self.timeout_elapsed = 0;
            }
        }

        if let Some(elapsed) = self.stoppage.as_mut() {
            *elapsed += 1;
        }

        if in_break && self.break_remaining > 0 {
            self.break_remaining -= 1;
        }
    }

    fn winner(&self) -> Option<TeamId> {
        if self.phase != Phase::Ended {
            return None;
        }
        match self.disqualified {
            [true, false] => return Some(TeamId::B),
            [false, true] => return Some(TeamId::A),
            _ => {}
        }
        if self.scores[0] > self.scores[1] {
            Some(TeamId::A)
        } else if self.scores[1] > self.scores[0] {
            Some(TeamId::B)
        } else {
            None
        }
    }
}

fn random_team(rng: &mut ChaCha8Rng) -> TeamId {
    if rng.gen_bool(0.5) { TeamId::A } else { TeamId::B }
}

fn generate_command(rng: &mut ChaCha8Rng) -> Command {
    match rng.gen_range(0..15) {
        0 => Command::StartMatch,
        1 => Command::BeginSecondHalf,
        2 => Command::ToggleClock,
        3 => Command::CallTimeout(random_team(rng)),
        4 => Command::EndTimeout,
        5 => Command::StartStoppage(StoppageReason::OutOfBounds),
        6 => Command::EndStoppage,
        7 => Command::Goal(random_team(rng)),
        8 => Command::EarlyStartFoul(random_team(rng)),
        9 => Command::TechnicalPoint(random_team(rng)),
        10 => Command::AdjustScore {
            team: random_team(rng),
            delta: rng.gen_range(-5..=5),
            reason: "Score adjust".to_string(),
        },
        11 => Command::ToggleBotOut(random_team(rng)),
        12 => Command::RenameTeam { team: random_team(rng), name: "Renamed".to_string() },
        13 => Command::PublishResult,
        // Resets are rare so matches get a chance to finish
        _ => {
            if rng.gen_bool(0.05) {
                Command::ResetMatch
            } else {
                Command::ToggleClock
            }
        }
    }
}

fn assert_same(engine: &Engine, reference: &ReferenceMatch, op: usize) {
    let snap = engine.snapshot();
    assert_eq!(snap.phase, reference.phase, "phase mismatch at op {}", op);
    assert_eq!(snap.running, reference.running, "running mismatch at op {}", op);
    assert_eq!(snap.half_remaining, reference.remaining, "half clock mismatch at op {}", op);
    assert_eq!(
        snap.half_time_remaining, reference.break_remaining,
        "break clock mismatch at op {}", op
    );
    for team in TeamId::ALL {
        let t = team.index();
        let record = snap.team(team);
        assert_eq!(record.score, reference.scores[t], "score mismatch for team {} at op {}", team, op);
        assert_eq!(record.timeouts_used, reference.timeouts_used[t], "timeouts mismatch at op {}", op);
        assert_eq!(record.disqualified, reference.disqualified[t], "DQ mismatch at op {}", op);
        assert_eq!(record.is_bot_out, reference.bot_out[t], "bot-out mismatch at op {}", op);
    }
    assert_eq!(
        snap.timeout.for_team.map(TeamId::index),
        reference.timeout_team,
        "timeout team mismatch at op {}", op
    );
    assert_eq!(snap.timeout.elapsed, reference.timeout_elapsed, "timeout elapsed mismatch at op {}", op);
    assert_eq!(snap.stoppage.running, reference.stoppage.is_some(), "stoppage mismatch at op {}", op);
    assert_eq!(snap.stoppage.elapsed, reference.stoppage.unwrap_or(0), "stoppage elapsed mismatch at op {}", op);
    assert_eq!(snap.winner, reference.winner(), "winner mismatch at op {}", op);
}

fn run_fuzz(seed: u64, ops: usize, tick_bias: f64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut engine = Engine::new(MatchConfig::default());
    let mut reference = ReferenceMatch::new();
    let mut ended = 0usize;

    for i in 0..ops {
        if rng.gen_bool(tick_bias) {
            let ticks = rng.gen_range(1..=20);
            for _ in 0..ticks {
                engine.tick();
                reference.tick();
            }
        } else {
            let cmd = generate_command(&mut rng);
            let accepted = engine.process_command(cmd.clone()).is_ok();
            let expected = reference.apply(&cmd);
            assert_eq!(
                accepted, expected,
                "acceptance mismatch for {} at op {}: engine={}, reference={}",
                cmd.name(), i, accepted, expected
            );
        }

        if reference.phase == Phase::Ended {
            ended += 1;
        }
        assert_same(&engine, &reference, i);
    }

    println!("Fuzz test passed!");
    println!("  Operations: {}", ops);
    println!("  Steps spent at full time: {}", ended);
}

#[test]
fn test_fuzz_against_reference() {
    run_fuzz(0x1337C0DE, 10_000, 0.6);
}

#[test]
fn test_fuzz_time_heavy() {
    // Long stretches of time: timeouts escalate and halves expire often
    run_fuzz(0xBADC0DE, 5_000, 0.85);
}

#[test]
fn test_fuzz_command_heavy() {
    run_fuzz(0x12345678, 5_000, 0.2);
}

#[test]
fn test_fuzz_invariants() {
    const SEED: u64 = 0xFACEFEED;
    const OPS: usize = 20_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut engine = Engine::new(MatchConfig::default());
    let mut technical_logs = 0usize;

    for _ in 0..OPS {
        if rng.gen_bool(0.7) {
            engine.advance(rng.gen_range(1..=50));
        } else {
            let _ = engine.process_command(generate_command(&mut rng));
        }

        let snap = engine.snapshot();
        for team in TeamId::ALL {
            assert!(snap.team(team).timeouts_used <= 1);
        }
        assert!(snap.half_remaining <= HALF);
        assert!(snap.total_played + snap.total_remaining == 2 * HALF);
        if snap.timeout.running {
            assert!(snap.timeout.elapsed < DQ);
            assert!(snap.clock_disabled);
        }
        if snap.stoppage.running {
            assert!(snap.clock_disabled);
        }
        if snap.phase != Phase::Ended {
            assert_eq!(snap.winner, None);
        }

        let count = engine
            .referee
            .log()
            .texts()
            .filter(|t| t.contains("awarded +1 technical point"))
            .count();
        assert!(count <= 2, "at most one automatic technical point per team");
        technical_logs = technical_logs.max(count);
    }

    println!("Invariant fuzz passed!  Max technical points in one match: {}", technical_logs);
}
