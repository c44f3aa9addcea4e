//! # simple_ecs_sim
//!
//! Headless simulation that drives a [`simple_ecs::Ecs`] through thousands of
//! component changes and entity recycles, checking every cached filter against
//! a brute-force scan after each tick.
//!
//! ```text
//! RUST_LOG=simple_ecs_sim=debug simple_ecs_sim --entities 5000 --ticks 600 --tick-rate 0
//! ```

mod components;
mod sim;
mod tick;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use simple_ecs::EcsConfig;
use sim::{SimConfig, Simulation};
use tick::{TickConfig, TickLoop};

#[derive(Parser)]
#[command(name = "simple_ecs_sim", about = "Entity churn simulation for simple_ecs")]
struct Args {
    /// Live population to maintain
    #[arg(short, long, default_value_t = 1000)]
    entities: usize,

    /// Number of ticks to run (0 = forever)
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Ticks per second (0 = unthrottled)
    #[arg(short = 'r', long, default_value_t = 60.0)]
    tick_rate: f64,

    /// RNG seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Optional JSON file with ECS sizing hints
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("simple_ecs_sim=info".parse()?)
                .add_directive("simple_ecs=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let ecs_config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading ECS config");
            EcsConfig::load(path)?
        }
        None => EcsConfig::default().with_entity_capacity(args.entities),
    };

    let sim_config = SimConfig {
        population: args.entities,
        seed: args.seed,
        ..SimConfig::default()
    };
    let sim = Simulation::new(sim_config, &ecs_config)?;
    info!(
        entities = sim.ecs().entity_count(),
        filters = sim.ecs().cache().len(),
        "simulation ready"
    );

    let mut tick_loop = TickLoop::new(
        TickConfig {
            tick_rate: args.tick_rate,
            max_ticks: args.ticks,
        },
        sim,
    );
    tick_loop.run()?;

    let totals = tick_loop.totals();
    let world = tick_loop.sim().ecs().world();
    info!(
        ticks = tick_loop.tick_id(),
        live = totals.live,
        moved = totals.moved,
        expired = totals.expired,
        spawned = totals.spawned,
        max_entity_id = world.max_entity_id(),
        recycled = world.recycled_len(),
        "simulation finished"
    );
    Ok(())
}
