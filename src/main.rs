//! Warfront runner
//!
//! Loads a scenario and plays AI-only turns, printing each turn's events and
//! narrative followed by a summary of who holds what.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use warfront::core::error::Result;
use warfront::narrative::{describe_events, LlmNarrator, Narrator, StaticNarrator};
use warfront::scenario::{load_scenario, Scenario};
use warfront::turn::TurnEngine;
use warfront::world::{GameState, LogEntry};

/// Play a warfront scenario with every realm under AI control
#[derive(Parser, Debug)]
#[command(name = "warfront")]
#[command(about = "Run AI-only turns of a warfront scenario")]
struct Args {
    /// Scenario TOML file (defaults to the built-in Border War map)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of turns to play
    #[arg(long, default_value_t = 20)]
    turns: u32,

    /// Random seed overriding the scenario's own
    #[arg(long)]
    seed: Option<u64>,

    /// Print the run as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TurnSummary {
    turn: u32,
    events: Vec<LogEntry>,
    narrative: String,
}

#[derive(Serialize)]
struct FactionSummary {
    name: String,
    locations: usize,
    strength: u32,
    gold: u32,
}

#[derive(Serialize)]
struct RunOutput {
    scenario: String,
    seed: u64,
    final_turn: u32,
    victory: Option<String>,
    control: Vec<FactionSummary>,
    turns: Vec<TurnSummary>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warfront=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => Scenario::demo()?,
    };
    let state = scenario.initial_state(args.seed)?;

    match LlmNarrator::from_env() {
        Ok(narrator) => {
            let narrator = narrator.with_preamble(preamble(&state));
            run(TurnEngine::new(narrator), &scenario, state, &args).await
        }
        Err(_) => {
            tracing::info!("LLM_API_KEY not set - using the static narrator");
            run(TurnEngine::new(StaticNarrator), &scenario, state, &args).await
        }
    }
}

async fn run<N: Narrator>(
    engine: TurnEngine<N>,
    scenario: &Scenario,
    mut state: GameState,
    args: &Args,
) -> Result<()> {
    if !args.json {
        println!("\n=== {} ===", scenario.name);
        if !scenario.description.is_empty() {
            println!("{}", scenario.description);
        }
    }

    let mut turns = Vec::new();
    for _ in 0..args.turns {
        if state.victory.is_some() {
            break;
        }
        let report = engine.process_turn(&state).await;
        let played = report.state.turn;

        if !args.json {
            println!("\n--- Turn {played} ---");
            for line in describe_events(&report.state, &report.events) {
                println!("  {line}");
            }
            println!("\n  {}", report.narrative);
        }

        turns.push(TurnSummary {
            turn: played,
            events: report.events,
            narrative: report.narrative,
        });
        state = report.state;
    }

    let control = control_summary(&state);
    let victory = state
        .victory
        .and_then(|f| state.faction(f))
        .map(|f| f.name.clone());

    if args.json {
        let output = RunOutput {
            scenario: scenario.name.clone(),
            seed: state.seed,
            final_turn: state.turn,
            victory,
            control,
            turns,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n=== After turn {} ===", state.turn);
    for faction in &control {
        println!(
            "  {:<24} {:>2} locations  {:>6} troops  {:>6} gold",
            faction.name, faction.locations, faction.strength, faction.gold
        );
    }
    if let Some(winner) = victory {
        println!("\n{winner} rules every land.");
    }
    Ok(())
}

fn control_summary(state: &GameState) -> Vec<FactionSummary> {
    state
        .factions
        .iter()
        .map(|f| FactionSummary {
            name: f.name.clone(),
            locations: state.controlled_locations(f.id).len(),
            strength: state.faction_strength(f.id),
            gold: f.gold,
        })
        .collect()
}

fn preamble(state: &GameState) -> String {
    let realms: Vec<&str> = state
        .factions
        .iter()
        .filter(|f| !f.id.is_neutral())
        .map(|f| f.name.as_str())
        .collect();
    format!("Realms: {}.\n", realms.join(", "))
}
