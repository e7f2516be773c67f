//! Headless battle runner.
//!
//! Drives fully automated battles through the engine's JSON API and
//! prints the result, for balance sweeps and integration smoke tests.

use anyhow::Context;
use clap::{Parser, Subcommand};

use ab_core::{simulate_battle, BattleRequest};

#[derive(Parser)]
#[command(name = "ab", version, about = "Arena battle engine runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one agent-vs-agent battle and print the result as JSON.
    Simulate {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Agent difficulty for the home side: easy | normal | hard.
        #[arg(long, default_value = "normal")]
        home: String,
        /// Agent difficulty for the away side.
        #[arg(long, default_value = "normal")]
        away: String,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
        /// Drop the event log from the output.
        #[arg(long)]
        summary: bool,
    },
    /// List the card catalog.
    Cards,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Simulate {
            seed,
            home,
            away,
            pretty,
            summary,
        } => simulate(seed, home, away, pretty, summary),
        Command::Cards => list_cards(),
    }
}

fn simulate(seed: u64, home: String, away: String, pretty: bool, summary: bool) -> anyhow::Result<()> {
    let request = BattleRequest {
        schema_version: ab_core::SCHEMA_VERSION,
        seed,
        home_deck: None,
        away_deck: None,
        home_difficulty: Some(home),
        away_difficulty: Some(away),
    };
    log::info!("simulating battle with seed {seed}");
    let response = simulate_battle(&request).context("battle simulation failed")?;

    let mut value = serde_json::to_value(&response)?;
    if summary {
        if let Some(obj) = value.as_object_mut() {
            obj.remove("events");
        }
    }
    let output = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{output}");
    Ok(())
}

fn list_cards() -> anyhow::Result<()> {
    let catalog = ab_core::catalog();
    println!("{:<16} {:<18} {:>4}  {}", "id", "name", "cost", "category");
    for card in catalog.cards() {
        println!(
            "{:<16} {:<18} {:>4}  {:?}",
            card.id, card.name, card.cost, card.category
        );
    }
    println!(
        "\ndefault deck ({} cards, avg cost {:.1}): {}",
        catalog.default_deck().len(),
        catalog.average_cost(catalog.default_deck()),
        catalog.default_deck().join(", ")
    );
    Ok(())
}
