use anyhow::Context;
use clap::Parser;
use robo_ref::script::{self, ReplayOutcome};
use robo_ref::{Engine, MatchConfig, MatchResult, TeamId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replay an officiating script and print the event log and result.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV script (at,command,team,value,reason)
    script: PathBuf,

    /// JSON match config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the half length in seconds
    #[arg(long)]
    half_seconds: Option<u32>,

    /// Keep ticking after the last row until no clock is running
    #[arg(long)]
    run_out: bool,

    /// Pretty-print published results
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("robo_ref=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MatchConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MatchConfig::default(),
    };
    if let Some(half) = args.half_seconds {
        config.half_seconds = half;
    }
    config.validate()?;

    let steps = script::load_script(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;
    println!("Replaying {} commands from {}", steps.len(), args.script.display());

    let pretty = args.pretty;
    let mut engine = Engine::new(config).with_sink(move |result: &MatchResult| {
        let json = if pretty { result.to_json_pretty() } else { result.to_json() };
        match json {
            Ok(json) => println!("\n=== Published Result ===\n{json}"),
            Err(err) => eprintln!("failed to encode result: {err}"),
        }
    });

    let outcome = script::replay(&mut engine, &steps, args.run_out);
    print_report(&engine, &outcome);
    Ok(())
}

fn print_report(engine: &Engine, outcome: &ReplayOutcome) {
    let snap = engine.snapshot();

    println!("\n=== Event Log (oldest first) ===");
    for entry in snap.log.iter().rev() {
        println!("{entry}");
    }

    println!("\n=== Final State ===");
    println!("Phase:      {}", snap.phase_badge());
    println!("Clock:      {}", snap.main_clock());
    for team in TeamId::ALL {
        let t = snap.team(team);
        println!(
            "Team {}:     {:<16} {:>3}{}{}",
            team,
            t.name,
            t.score,
            if t.disqualified { "  DISQUALIFIED" } else { "" },
            if t.is_bot_out { "  BOT OUT" } else { "" },
        );
    }
    if let Some(line) = snap.result_line() {
        println!("Result:     {line}");
    }
    println!("Session:    {} s", outcome.elapsed);
    println!("Applied:    {}", outcome.applied);
    println!("Rejected:   {}", outcome.rejected.len());
    for (line, err) in &outcome.rejected {
        println!("  line {line}: {err}");
    }
    println!("State hash: {:#018x}", engine.state_hash());
}
