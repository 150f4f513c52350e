//! Batch ecosystem run binary

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use savanna::simulation::{Ecosystem, RunOutput};
use savanna::taxonomy::savanna::savanna_taxonomy;
use savanna::SimulationParams;

#[derive(Parser, Debug)]
#[command(name = "savanna_run", about = "Run one seeded ecosystem simulation to completion")]
struct Args {
    /// RNG seed for the run
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Optional TOML file overriding the simulation parameters
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(long, default_value_t = 12)]
    grass: u32,

    #[arg(long, default_value_t = 6)]
    impala: u32,

    #[arg(long, default_value_t = 4)]
    zebra: u32,

    #[arg(long, default_value_t = 2)]
    lion: u32,

    /// Where to write the JSON run output
    #[arg(long, default_value = "run_output.json")]
    output: PathBuf,
}

fn main() -> savanna::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("savanna=info")
        .init();

    let args = Args::parse();

    let params = match &args.params {
        Some(path) => SimulationParams::load(path)?,
        None => SimulationParams::default(),
    };
    params.validate().map_err(savanna::EcoError::InvalidConfig)?;

    println!("Starting ecosystem run (seed {})", args.seed);
    println!("========================================");
    println!(
        "Population: {} grass, {} impala, {} zebra, {} lions",
        args.grass, args.impala, args.zebra, args.lion
    );

    let mut eco = Ecosystem::new(savanna_taxonomy(), params, args.seed);
    for (species, count) in [
        ("Grass", args.grass),
        ("Impala", args.impala),
        ("Zebra", args.zebra),
        ("Lion", args.lion),
    ] {
        for _ in 0..count {
            eco.add_individual(species)?;
        }
    }

    eco.start()?;
    let start = Instant::now();
    let status = eco.run_to_completion()?;
    let elapsed = start.elapsed();

    let output = RunOutput::new(&eco.state, status, args.seed, eco.population.len(), elapsed);
    println!("{}", output.summary());

    std::fs::write(&args.output, output.to_json())?;
    println!("\nFull output written to {}", args.output.display());

    Ok(())
}
