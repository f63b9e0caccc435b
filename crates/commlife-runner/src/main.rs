//! Host driver: builds a world from the default configuration and runs it,
//! reporting and resetting the counters every `record_frequency` ticks.

mod telemetry;

use anyhow::{Context, Result};
use commlife_core::SimulationConfig;
use commlife_world::{default_tasks, World};
use tracing::{debug, info};

fn main() -> Result<()> {
    let config = SimulationConfig::default();
    config.validate().context("invalid simulation configuration")?;

    let json_logs = std::env::var("COMMLIFE_LOG_FORMAT").is_ok_and(|v| v == "json");
    telemetry::init_telemetry(json_logs)?;

    info!(
        event = "runner_started",
        seed = config.seed,
        width = config.world.width,
        height = config.world.height,
        start_num = config.start_num,
        num_ticks = config.num_ticks,
        "Starting commlife runner"
    );

    let mut world = World::new(config.clone(), default_tasks())?;
    for _ in 0..config.start_num {
        world.inject_random()?;
    }

    let task_names: Vec<&str> = world.tasks().iter().map(|t| t.name()).collect();
    info!(tasks = ?task_names, "Registered tasks");

    let frequency = config.record_frequency.max(1);
    let mut remaining = config.num_ticks;
    while remaining > 0 {
        let chunk = remaining.min(frequency);
        world.run(chunk);
        remaining -= chunk;

        let snapshot = world.snapshot();
        info!(
            event = "record",
            tick = snapshot.tick,
            population = snapshot.population,
            mean_points = snapshot.points.mean,
            record = %serde_json::to_string(&snapshot)?,
            "Interval record"
        );
        let leader = world
            .organism_data()
            .into_iter()
            .max_by(|a, b| a.points.total_cmp(&b.points));
        if let Some(leader) = leader {
            debug!(
                event = "leader",
                tick = snapshot.tick,
                organism = %serde_json::to_string(&leader)?,
                "Highest-scoring organism"
            );
        }
        world.reset_counters();

        if snapshot.population == 0 {
            info!(event = "population_extinct", tick = snapshot.tick, "Population died out");
            break;
        }
    }

    info!(event = "runner_finished", tick = world.tick(), "Runner finished");
    Ok(())
}
