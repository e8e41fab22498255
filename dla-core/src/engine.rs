//! The tick-driven aggregation engine.
//!
//! [`AggregationEngine`] owns the aggregate, the walker pool and all
//! random state, and is advanced explicitly by a caller-owned clock:
//! feed elapsed time into [`AggregationEngine::tick`], or run discrete
//! steps directly with [`AggregationEngine::step`].

use rand::{SeedableRng, rngs::SmallRng};
use tracing::debug;

use crate::{
    aggregate::AggregateSet,
    config::{Config, ConfigError},
    events::GrowthSink,
    pending::FreezeBuffer,
    phases,
    types::Cell,
    walker::WalkerPool,
};

/// Grows a 3-D aggregate from a seed at the origin.
///
/// All random draws derive from the construction seed, so two engines
/// built with the same configuration and seed produce identical
/// aggregates and identical event sequences, independent of how the
/// parallel walk phase is scheduled.
pub struct AggregationEngine {
    aggregate: AggregateSet,
    pool: WalkerPool,
    cfg: Config,
    buf: FreezeBuffer,
    rng: SmallRng,
    seed: u64,
    steps: u64,
    accumulator: f32,
}

impl AggregationEngine {
    /// Creates an engine with the seed cell at the origin and a walker
    /// population spawned on the bounding cube's faces.
    ///
    /// ### Errors
    /// Returns a [`ConfigError`] if any configuration field is out of
    /// range; the engine cannot be constructed in an invalid state.
    pub fn new(cfg: Config, seed: u64) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let pool = WalkerPool::spawn_on_faces(cfg.initial_walkers, cfg.bounds_radius, &mut rng);

        Ok(Self {
            aggregate: AggregateSet::new(Cell::ZERO),
            pool,
            cfg,
            buf: FreezeBuffer::new(),
            rng,
            seed,
            steps: 0,
            accumulator: 0.0,
        })
    }

    /// Feeds elapsed time to the engine's fixed-step clock.
    ///
    /// Elapsed seconds accumulate across calls; once the accumulator
    /// reaches the configured step interval it is reset to zero and
    /// exactly one step runs. A lagging caller is not caught up — at
    /// most one step runs per call.
    ///
    /// ### Returns
    /// `true` if a step ran.
    pub fn tick(&mut self, dt: f32, sink: &mut dyn GrowthSink) -> bool {
        self.accumulator += dt;
        if self.accumulator < self.cfg.step_interval {
            return false;
        }
        self.accumulator = 0.0;
        self.step(sink);
        true
    }

    /// Runs one full simulation step.
    ///
    /// Phases, in order: population decay, parallel walk, sequential
    /// merge, respawn. See [`crate::phases`] for each phase's contract.
    ///
    /// ### Returns
    /// The cells frozen this step, in emission order.
    pub fn step(&mut self, sink: &mut dyn GrowthSink) -> Vec<Cell> {
        assert!(!self.aggregate.is_empty(), "aggregate lost its seed cell");

        self.steps += 1;
        let pool_target = phases::population_phase(&mut self.pool, &self.cfg, self.steps);
        let fates = phases::walk_phase(
            &self.pool,
            &self.aggregate,
            &self.cfg,
            &self.buf,
            self.seed,
            self.steps,
        );
        let frozen = phases::merge_phase(&mut self.aggregate, &self.buf, sink);
        phases::respawn_phase(&mut self.pool, &fates, self.cfg.bounds_radius, &mut self.rng);

        debug!(
            step = self.steps,
            walkers = self.pool.len(),
            pool_target,
            frozen = frozen.len(),
            cells = self.aggregate.len(),
            "simulation step"
        );

        frozen
    }

    pub fn aggregate(&self) -> &AggregateSet {
        &self.aggregate
    }

    pub fn walkers(&self) -> &WalkerPool {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::events::{GrowthEvent, NullSink};
    use std::collections::HashSet;

    fn small_config() -> Config {
        let mut cfg = Config::default();
        cfg.bounds_radius = 6;
        cfg.initial_walkers = 64;
        cfg.decay_steps_per_walker = 1_000;
        cfg
    }

    #[test]
    fn new_engine_holds_only_the_seed_cell() {
        let engine = AggregationEngine::new(small_config(), 42).unwrap();

        assert_eq!(engine.aggregate().len(), 1);
        assert!(engine.aggregate().contains(Cell::ZERO));
        assert_eq!(engine.walkers().len(), 64);
        assert_eq!(engine.steps(), 0);
    }

    #[test]
    fn invalid_configurations_are_rejected_at_construction() {
        let mut cfg = Config::default();
        cfg.bounds_radius = 0;
        assert_eq!(
            AggregationEngine::new(cfg, 1).err(),
            Some(ConfigError::NonPositiveBounds(0))
        );

        let mut cfg = Config::default();
        cfg.population_floor = 0;
        assert_eq!(
            AggregationEngine::new(cfg, 1).err(),
            Some(ConfigError::FloorTooLow(0))
        );
    }

    #[test]
    fn tick_runs_at_most_one_step_per_call() {
        let mut cfg = small_config();
        cfg.step_interval = 0.1;
        let mut engine = AggregationEngine::new(cfg, 7).unwrap();
        let mut sink = NullSink;

        // Below the interval: nothing runs yet.
        assert!(!engine.tick(0.05, &mut sink));
        assert_eq!(engine.steps(), 0);

        // Crossing the interval runs one step and resets the clock.
        assert!(engine.tick(0.06, &mut sink));
        assert_eq!(engine.steps(), 1);

        // A huge delta still runs exactly one step — no catch-up.
        assert!(engine.tick(5.0, &mut sink));
        assert_eq!(engine.steps(), 2);

        assert!(!engine.tick(0.05, &mut sink));
        assert_eq!(engine.steps(), 2);
    }

    #[test]
    fn identical_seeds_produce_identical_runs() {
        let mut events_a: Vec<GrowthEvent> = Vec::new();
        let mut events_b: Vec<GrowthEvent> = Vec::new();

        let mut a = AggregationEngine::new(small_config(), 1234).unwrap();
        let mut b = AggregationEngine::new(small_config(), 1234).unwrap();

        for _ in 0..60 {
            a.step(&mut events_a);
            b.step(&mut events_b);
        }

        assert_eq!(events_a, events_b);
        assert_eq!(a.walkers().walkers, b.walkers().walkers);

        let cells_a: HashSet<Cell> = a.aggregate().iter().copied().collect();
        let cells_b: HashSet<Cell> = b.aggregate().iter().copied().collect();
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn aggregate_grows_monotonically_without_duplicate_events() {
        let mut engine = AggregationEngine::new(small_config(), 99).unwrap();
        let mut events: Vec<GrowthEvent> = Vec::new();

        let mut prev_len = engine.aggregate().len();
        for _ in 0..200 {
            engine.step(&mut events);
            assert!(engine.aggregate().len() >= prev_len);
            prev_len = engine.aggregate().len();
        }

        // In a 6-cell-radius domain, 200 steps of 64 walkers freeze
        // plenty of cells.
        assert!(!events.is_empty());

        let unique: HashSet<Cell> = events.iter().map(|e| e.cell).collect();
        assert_eq!(unique.len(), events.len(), "a cell fired twice");

        // Every emitted cell is in the aggregate, and the aggregate is
        // exactly the seed plus the emitted cells.
        assert_eq!(engine.aggregate().len(), 1 + events.len());
        for event in &events {
            assert!(engine.aggregate().contains(event.cell));
        }
    }

    #[test]
    fn frozen_cells_were_adjacent_before_their_step() {
        let mut engine = AggregationEngine::new(small_config(), 4).unwrap();
        let mut sink = NullSink;

        for _ in 0..100 {
            let before = engine.aggregate().clone();
            let frozen = engine.step(&mut sink);
            for &cell in &frozen {
                assert!(
                    before.is_adjacent(cell),
                    "{cell} froze without touching the aggregate"
                );
            }
        }
    }

    #[test]
    fn population_decays_to_the_documented_target() {
        let mut cfg = Config::default();
        cfg.bounds_radius = 10;
        cfg.initial_walkers = 50;
        cfg.population_floor = 5;
        cfg.decay_steps_per_walker = 10;

        let mut engine = AggregationEngine::new(cfg, 8).unwrap();
        let mut sink = NullSink;

        let mut prev = engine.walkers().len();
        for _ in 0..90 {
            engine.step(&mut sink);
            assert!(engine.walkers().len() <= prev);
            prev = engine.walkers().len();
        }
        assert_eq!(engine.walkers().len(), 41);

        for _ in 0..1_000 {
            engine.step(&mut sink);
        }
        assert_eq!(engine.walkers().len(), 5);
    }
}
