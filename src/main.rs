//! Quartermaster -- plans one turn of a territorial-conquest wargame.
//!
//! Reads a scenario snapshot, plans the turn for one player and prints the
//! plan as JSON on stdout. Logs go to stderr and are filtered with
//! `RUST_LOG` (default `info`).
//!
//! Usage:
//!   quartermaster --scenario FILE [OPTIONS]
//!
//! Options:
//!   --scenario FILE  Scenario JSON to plan for (required)
//!   --config FILE    Planner configuration JSON (default: built-in)
//!   --player NAME    Player to plan for (default: first player)
//!   --seed N         Random seed, 0 for entropy (overrides the config)

use std::env;
use std::process;

use tracing::error;
use tracing_subscriber::EnvFilter;

use quartermaster::config::PlannerConfig;
use quartermaster::engine::Planner;
use quartermaster::protocol::Scenario;
use quartermaster::purchase::RulesValidator;

struct Args {
    scenario: String,
    config: Option<String>,
    player: Option<String>,
    seed: Option<u64>,
}

/// The value following the flag at `i`, advancing `i` past it.
fn take_value(args: &[String], i: &mut usize) -> Result<String, String> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("missing value for {}", flag))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut scenario = None;
    let mut config = None;
    let mut player = None;
    let mut seed = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => scenario = Some(take_value(&args, &mut i)?),
            "--config" => config = Some(take_value(&args, &mut i)?),
            "--player" => player = Some(take_value(&args, &mut i)?),
            "--seed" => {
                let raw = take_value(&args, &mut i)?;
                seed = Some(raw.parse().map_err(|_| format!("invalid --seed value: {}", raw))?);
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(Args {
        scenario: scenario.ok_or("--scenario is required")?,
        config,
        player,
        seed,
    })
}

fn print_usage() {
    eprintln!("Usage: quartermaster --scenario FILE [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario FILE  Scenario JSON to plan for (required)");
    eprintln!("  --config FILE    Planner configuration JSON (default: built-in)");
    eprintln!("  --player NAME    Player to plan for (default: first player)");
    eprintln!("  --seed N         Random seed, 0 for entropy (overrides the config)");
}

fn run(args: Args) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PlannerConfig::from_json_file(path)?,
        None => PlannerConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut scenario = Scenario::from_json_file(&args.scenario)?;
    let player = match &args.player {
        Some(name) => scenario
            .board
            .find_player(name)
            .ok_or_else(|| format!("unknown player '{}'", name))?,
        None => scenario
            .board
            .player_ids()
            .next()
            .ok_or("scenario has no players")?,
    };
    let catalog = scenario.catalog();

    let mut planner = Planner::new(config);
    let plan = planner.plan_turn(&mut scenario.board, player, &catalog, &mut RulesValidator)?;
    Ok(plan.to_json()?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            process::exit(2);
        }
    };
    match run(args) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
