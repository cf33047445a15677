//! Property tests for scoring, the clock format and match-long invariants.

use proptest::prelude::*;
use robo_ref::team::Team;
use robo_ref::{fmt_clock, Command, Engine, MatchConfig, Phase, StoppageReason, TeamId};

fn team_strategy() -> impl Strategy<Value = TeamId> {
    prop_oneof![Just(TeamId::A), Just(TeamId::B)]
}

/// Commands plus a time step, encoded so shrinking stays readable
#[derive(Clone, Debug)]
enum Op {
    Cmd(Command),
    Advance(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u32..120).prop_map(Op::Advance),
        1 => Just(Op::Cmd(Command::StartMatch)),
        1 => Just(Op::Cmd(Command::BeginSecondHalf)),
        1 => Just(Op::Cmd(Command::ToggleClock)),
        1 => team_strategy().prop_map(|t| Op::Cmd(Command::CallTimeout(t))),
        1 => Just(Op::Cmd(Command::EndTimeout)),
        1 => Just(Op::Cmd(Command::StartStoppage(StoppageReason::NoPlay))),
        1 => Just(Op::Cmd(Command::EndStoppage)),
        2 => team_strategy().prop_map(|t| Op::Cmd(Command::Goal(t))),
        1 => team_strategy().prop_map(|t| Op::Cmd(Command::EarlyStartFoul(t))),
        1 => (team_strategy(), -10i32..10).prop_map(|(team, delta)| Op::Cmd(Command::AdjustScore {
            team,
            delta,
            reason: "Score adjust".to_string(),
        })),
        1 => Just(Op::Cmd(Command::PublishResult)),
    ]
}

proptest! {
    #[test]
    fn prop_score_never_negative(deltas in prop::collection::vec(-1_000i32..1_000, 0..200)) {
        let mut team = Team::new("Team A");
        let mut expected: i64 = 0;
        for delta in deltas {
            let score = team.adjust_score(delta);
            expected = (expected + i64::from(delta)).max(0);
            prop_assert_eq!(i64::from(score), expected);
        }
    }

    #[test]
    fn prop_fmt_clock_is_minutes_and_padded_seconds(seconds in 0u32..100_000) {
        let text = fmt_clock(seconds);
        let (minutes, secs) = text.split_once(':').expect("m:ss");
        prop_assert_eq!(secs.len(), 2);
        let minutes: u32 = minutes.parse().unwrap();
        let secs: u32 = secs.parse().unwrap();
        prop_assert!(secs < 60);
        prop_assert_eq!(minutes * 60 + secs, seconds);
    }

    #[test]
    fn prop_rejected_commands_change_nothing(ops in prop::collection::vec(op_strategy(), 0..150)) {
        let mut engine = Engine::new(MatchConfig::default());
        for op in ops {
            match op {
                Op::Advance(seconds) => engine.advance(seconds),
                Op::Cmd(cmd) => {
                    let before = engine.state_hash();
                    if engine.process_command(cmd).is_err() {
                        prop_assert_eq!(engine.state_hash(), before);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_match_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..300)) {
        let mut engine = Engine::new(MatchConfig::default());
        let mut disqualified = [false; 2];
        let mut last_phase = engine.referee.phase();

        for op in ops {
            match op {
                Op::Advance(seconds) => engine.advance(seconds),
                Op::Cmd(cmd) => { let _ = engine.process_command(cmd); }
            }
            let snap = engine.snapshot();

            // No resets in the op mix, so phase only moves forward
            prop_assert!(snap.phase >= last_phase);
            last_phase = snap.phase;

            for team in TeamId::ALL {
                let record = snap.team(team);
                prop_assert!(record.timeouts_used <= 1);
                // Disqualification latches
                if disqualified[team.index()] {
                    prop_assert!(record.disqualified);
                }
                disqualified[team.index()] = record.disqualified;
            }

            match snap.phase {
                Phase::Ended => {
                    let expected = match (disqualified[0], disqualified[1]) {
                        (true, false) => Some(TeamId::B),
                        (false, true) => Some(TeamId::A),
                        _ => match snap.teams[0].score.cmp(&snap.teams[1].score) {
                            std::cmp::Ordering::Greater => Some(TeamId::A),
                            std::cmp::Ordering::Less => Some(TeamId::B),
                            std::cmp::Ordering::Equal => None,
                        },
                    };
                    prop_assert_eq!(snap.winner, expected);
                    prop_assert!(!engine.needs_tick() || snap.timeout.running || snap.stoppage.running);
                }
                _ => prop_assert_eq!(snap.winner, None),
            }
        }
    }
}
