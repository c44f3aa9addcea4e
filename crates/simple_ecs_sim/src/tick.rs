//! Fixed-timestep tick loop.
//!
//! Each tick advances the [`Simulation`] by one step and logs what changed.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::sim::{Simulation, TickStats};

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second. `0.0` runs unthrottled with a nominal 60 Hz
    /// step.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// The tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Current tick counter.
    tick_id: u64,
    config: TickConfig,
    sim: Simulation,
    /// Running totals across all ticks.
    totals: TickStats,
}

impl TickLoop {
    /// Create a new tick loop driving `sim`.
    #[must_use]
    pub fn new(config: TickConfig, sim: Simulation) -> Self {
        Self {
            tick_id: 0,
            config,
            sim,
            totals: TickStats::default(),
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns the simulation.
    #[must_use]
    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    /// Returns expired/spawned totals and the latest live/frozen counts.
    #[must_use]
    pub fn totals(&self) -> TickStats {
        self.totals
    }

    /// Run one tick.
    pub fn tick(&mut self, dt: f64) -> Result<TickStats> {
        self.tick_id += 1;
        let stats = self.sim.step(dt as f32)?;

        self.totals.moved += stats.moved;
        self.totals.expired += stats.expired;
        self.totals.spawned += stats.spawned;
        self.totals.live = stats.live;
        self.totals.frozen = stats.frozen;

        debug!(
            tick_id = self.tick_id,
            live = stats.live,
            moved = stats.moved,
            frozen = stats.frozen,
            expired = stats.expired,
            spawned = stats.spawned,
            "tick complete"
        );
        Ok(stats)
    }

    /// Run for the configured number of ticks, or until an error.
    pub fn run(&mut self) -> Result<()> {
        let throttled = self.config.tick_rate > 0.0;
        let rate = if throttled {
            self.config.tick_rate
        } else {
            60.0
        };
        let tick_duration = Duration::from_secs_f64(1.0 / rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64())?;

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            if !throttled {
                continue;
            }
            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
        Ok(())
    }
}
