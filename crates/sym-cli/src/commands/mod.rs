pub mod run;
pub mod snapshot;

use sym_simulation::{Population, SimConfig};

/// Events kept by a CLI run; older ones are dropped.
pub const EVENT_LOG_CAPACITY: usize = 500;

/// How to seed and drive a population.
pub struct RunOptions {
    pub agents: usize,
    pub ticks: u64,
    pub dt: f64,
    pub seed: u64,
}

/// Seed a population and step it `opts.ticks` times.
/// With `audit`, the invariants are checked after every tick and the first
/// violation aborts the run.
fn simulate(opts: &RunOptions, audit: bool) -> Result<Population, String> {
    let config = SimConfig::default()
        .with_seed(opts.seed)
        .with_agent_count(opts.agents)
        .with_max_events(EVENT_LOG_CAPACITY);

    let mut pop = Population::new(config).map_err(|e| format!("invalid configuration: {e}"))?;
    pop.seed_default();

    for _ in 0..opts.ticks {
        pop.step(opts.dt)
            .map_err(|e| format!("simulation error: {e}"))?;
        if audit {
            pop.check_invariants()
                .map_err(|e| format!("tick {}: {e}", pop.current_tick()))?;
        }
    }
    Ok(pop)
}
