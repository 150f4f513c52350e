//! Savanna - Entry Point
//!
//! Interactive control loop over one ecosystem: seed a population, start a
//! run, step it, and inspect the classified state between runs.

use savanna::core::error::Result;
use savanna::core::types::IndividualId;
use savanna::simulation::Ecosystem;
use savanna::taxonomy::savanna::savanna_taxonomy;
use savanna::SimulationParams;

use std::io::{self, Write};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("savanna=debug")
        .init();

    tracing::info!("Savanna starting...");

    let params = SimulationParams::default();
    params.validate().map_err(savanna::EcoError::InvalidConfig)?;

    let mut eco = Ecosystem::new(savanna_taxonomy(), params, 0xEC0);
    seed_default_population(&mut eco)?;

    println!("\n=== SAVANNA ===");
    println!("Taxonomy-driven predator/prey ecosystem simulator");
    println!();
    println!("Commands:");
    println!("  species         - List the admissible species classes");
    println!("  add <Species>   - Admit an individual (e.g. add Impala)");
    println!("  remove <id>     - Remove an individual by numeric id");
    println!("  relink          - Reclassify and rebuild eats edges");
    println!("  start           - Classify and start a run");
    println!("  step / t        - Advance the run by one step");
    println!("  run <n>         - Advance up to n steps (default 50)");
    println!("  state           - Dump the reasoned state as JSON");
    println!("  status / s      - Show per-species counts");
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("species") => {
                for species in savanna::taxonomy::list_species(&eco.graph) {
                    println!("  {}", species);
                }
            }
            Some("add") => match parts.next() {
                Some(species) => match eco.add_individual(species) {
                    Ok(id) => println!("added {} ({})", id, species),
                    Err(e) => println!("error: {}", e),
                },
                None => println!("usage: add <Species>"),
            },
            Some("remove") => match parts.next().and_then(|s| s.parse::<u64>().ok()) {
                Some(n) => match eco.remove_individual(IndividualId(n)) {
                    Ok(()) => println!("removed #{}", n),
                    Err(e) => println!("error: {}", e),
                },
                None => println!("usage: remove <id>"),
            },
            Some("relink") => match eco.auto_relink() {
                Ok(()) => println!("relinked"),
                Err(e) => println!("error: {}", e),
            },
            Some("start") => match eco.start() {
                Ok(()) => {
                    println!("run started");
                    print_status(&eco);
                }
                Err(e) => println!("error: {}", e),
            },
            Some("step") | Some("t") => step_once(&mut eco),
            Some("run") => {
                let n = parts.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(50);
                run_steps(&mut eco, n);
            }
            Some("state") => println!("{}", serde_json::to_string_pretty(&eco.state_snapshot())?),
            Some("status") | Some("s") => print_status(&eco),
            Some("quit") | Some("q") => break,
            Some(other) => println!("unknown command: {}", other),
            None => {}
        }
    }

    Ok(())
}

/// A small mixed starting population around the demo food web
fn seed_default_population(eco: &mut Ecosystem) -> Result<()> {
    for (species, count) in [
        ("Grass", 10),
        ("Acacia", 5),
        ("Impala", 6),
        ("Zebra", 4),
        ("Lion", 2),
        ("Cheetah", 1),
    ] {
        for _ in 0..count {
            eco.add_individual(species)?;
        }
    }
    Ok(())
}

fn step_once(eco: &mut Ecosystem) {
    match eco.step() {
        Ok(report) => {
            match report.status {
                Some(reason) => println!("t={} -> {:?}", report.t, reason),
                None => println!("t={}", report.t),
            }
            print_status(eco);
        }
        Err(e) => println!("error: {}", e),
    }
}

fn run_steps(eco: &mut Ecosystem, n: u32) {
    for _ in 0..n {
        match eco.step() {
            Ok(report) => {
                if let Some(reason) = report.status {
                    println!("t={} -> {:?}", report.t, reason);
                    break;
                }
            }
            Err(e) => {
                println!("error: {}", e);
                break;
            }
        }
    }
    print_status(eco);
}

fn print_status(eco: &Ecosystem) {
    let pools = eco.population.by_species();
    println!(
        "t={} | {} individuals, {} species",
        eco.state.t,
        eco.population.len(),
        pools.len()
    );
    for (species, members) in &pools {
        println!("  {:<12} {}", species.to_string(), members.len());
    }
}
