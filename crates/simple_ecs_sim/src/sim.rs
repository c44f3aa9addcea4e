//! The churn simulation.
//!
//! Each tick moves everything that matches "has Position and Velocity, is not
//! Frozen", randomly freezes and thaws entities, counts down lifetimes and
//! destroys expired entities, then respawns to keep the population steady.
//! Every cached filter is checked against a brute-force scan at the end of
//! the tick.

use anyhow::{Result, ensure};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use simple_ecs::{Ecs, EcsConfig, Entity, Filter, FilterId};
use tracing::debug;

use crate::components::{Frozen, Lifetime, Position, Velocity};

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Target live population; respawning tops the world back up to this.
    pub population: usize,
    /// RNG seed. The same seed yields the same run.
    pub seed: u64,
    /// Chance per tick that a live entity toggles [`Frozen`].
    pub freeze_chance: f64,
    /// Chance that a spawned entity gets a [`Velocity`].
    pub velocity_chance: f64,
    /// Chance that a spawned entity gets a [`Lifetime`].
    pub mortal_chance: f64,
    /// Upper bound for a spawned [`Lifetime`].
    pub max_lifetime: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            population: 1000,
            seed: 42,
            freeze_chance: 0.05,
            velocity_chance: 0.75,
            mortal_chance: 0.5,
            max_lifetime: 120,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Live entities after the tick.
    pub live: usize,
    /// Entities that moved.
    pub moved: usize,
    /// Entities currently frozen.
    pub frozen: usize,
    /// Entities destroyed because their lifetime ran out.
    pub expired: usize,
    /// Entities created to refill the population.
    pub spawned: usize,
}

/// Simulation state: the ECS plus the filters its systems use.
#[derive(Debug)]
pub struct Simulation {
    ecs: Ecs,
    rng: ChaCha8Rng,
    config: SimConfig,
    moving: FilterId,
    frozen: FilterId,
    mortal: FilterId,
}

impl Simulation {
    /// Create the ECS, declare the filters, and spawn the initial population.
    pub fn new(config: SimConfig, ecs_config: &EcsConfig) -> Result<Self> {
        let mut ecs = Ecs::with_config(ecs_config);
        let moving = ecs
            .filter()
            .include::<Position>()
            .include::<Velocity>()
            .exclude::<Frozen>()
            .build();
        let frozen = ecs.filter().include::<Frozen>().build();
        let mortal = ecs.filter().include::<Lifetime>().build();

        let mut sim = Self {
            ecs,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            moving,
            frozen,
            mortal,
        };
        for _ in 0..sim.config.population {
            sim.spawn()?;
        }
        Ok(sim)
    }

    /// Returns the ECS.
    #[must_use]
    pub fn ecs(&self) -> &Ecs {
        &self.ecs
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<TickStats> {
        let mut stats = TickStats {
            moved: self.movement(dt),
            ..TickStats::default()
        };
        self.toggle_frozen()?;
        stats.expired = self.expire()?;

        while self.ecs.entity_count() < self.config.population {
            self.spawn()?;
            stats.spawned += 1;
        }

        self.verify_filters()?;
        stats.live = self.ecs.entity_count();
        stats.frozen = self.ecs.filter_ref(self.frozen).map_or(0, Filter::len);
        Ok(stats)
    }

    fn spawn(&mut self) -> Result<Entity> {
        let entity = self.ecs.create_entity();
        let position = Vec3::new(
            self.rng.gen_range(-100.0..100.0),
            self.rng.gen_range(-100.0..100.0),
            0.0,
        );
        self.ecs.add_component(entity, Position(position))?;

        if self.rng.gen_bool(self.config.velocity_chance) {
            let velocity = Vec3::new(
                self.rng.gen_range(-5.0..5.0),
                self.rng.gen_range(-5.0..5.0),
                0.0,
            );
            self.ecs.add_component(entity, Velocity(velocity))?;
        }
        if self.rng.gen_bool(self.config.mortal_chance) {
            let remaining = self.rng.gen_range(1..=self.config.max_lifetime.max(1));
            self.ecs.add_component(entity, Lifetime { remaining })?;
        }
        Ok(entity)
    }

    fn movement(&mut self, dt: f32) -> usize {
        let moving: Vec<Entity> = self.ecs.query(self.moving).collect();
        for &entity in &moving {
            let Some(&velocity) = self.ecs.get_component::<Velocity>(entity) else {
                continue;
            };
            if let Some(position) = self.ecs.get_component_mut::<Position>(entity) {
                *position = position.advanced(velocity, dt);
            }
        }
        moving.len()
    }

    fn toggle_frozen(&mut self) -> Result<()> {
        let live: Vec<Entity> = self.ecs.entities().collect();
        for entity in live {
            if !self.rng.gen_bool(self.config.freeze_chance) {
                continue;
            }
            if self.ecs.has_component::<Frozen>(entity) {
                self.ecs.remove_component::<Frozen>(entity)?;
            } else {
                self.ecs.add_component(entity, Frozen)?;
            }
        }
        Ok(())
    }

    fn expire(&mut self) -> Result<usize> {
        let mut mortal: Vec<Entity> = self.ecs.query(self.mortal).collect();
        // Destruction order decides recycling order, which must not depend on
        // hash iteration order for a seeded run to be reproducible.
        mortal.sort_unstable_by_key(|e| e.id());
        let mut expired = 0;
        for entity in mortal {
            let Some(lifetime) = self.ecs.get_component_mut::<Lifetime>(entity) else {
                continue;
            };
            lifetime.remaining = lifetime.remaining.saturating_sub(1);
            if lifetime.remaining == 0 {
                ensure!(self.ecs.destroy_entity(entity), "{entity} expired twice");
                expired += 1;
            }
        }
        Ok(expired)
    }

    /// Compare every cached filter with a from-scratch evaluation.
    fn verify_filters(&self) -> Result<()> {
        for (id, filter) in self.ecs.cache().filters() {
            let mut expected = 0;
            for entity in self.ecs.entities() {
                let matches = filter.test(entity, self.ecs.components());
                ensure!(
                    matches == filter.contains(entity),
                    "filter {} disagrees on {entity}: cached={}, actual={matches}",
                    id.index(),
                    filter.contains(entity)
                );
                expected += usize::from(matches);
            }
            ensure!(
                expected == filter.len(),
                "filter {} holds {} entities, {expected} expected",
                id.index(),
                filter.len()
            );
        }
        debug!(filters = self.ecs.cache().len(), "filters verified");
        Ok(())
    }
}
