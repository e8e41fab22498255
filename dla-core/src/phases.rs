//! High-level simulation phases for the walker–aggregate system.
//!
//! One simulation step runs:
//! 1. [`population_phase`] — shrink the walker pool toward the decay
//!    schedule's current target.
//! 2. [`walk_phase`] — advance every walker in parallel against a
//!    read-only aggregate, recording freeze candidates in a
//!    [`FreezeBuffer`].
//! 3. [`merge_phase`] — drain the buffer sequentially, insert unique
//!    cells into the aggregate, and emit one [`GrowthEvent`] each.
//! 4. [`respawn_phase`] — replace frozen and escaped walkers with fresh
//!    boundary spawns.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;

use crate::{
    aggregate::AggregateSet,
    config::Config,
    events::{GrowthEvent, GrowthSink},
    pending::FreezeBuffer,
    types::{Cell, within_bounds},
    walker::{Walker, WalkerPool, random_step},
};

/// What happened to one walker during [`walk_phase`].
///
/// Each variant carries the walker's candidate position for that step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkerFate {
    /// The candidate was free and in bounds; the walker moves there.
    Moved(Cell),
    /// The candidate touched the aggregate; the walker freezes and will
    /// be respawned.
    Frozen(Cell),
    /// The candidate left the bounds; the walker is discarded and will
    /// be respawned without freezing.
    Escaped(Cell),
}

/// Derives the random generator for one walker's step.
///
/// Seeding from (master seed, step counter, walker index) through a
/// splitmix64 finalizer gives every walker an independent stream whose
/// draws do not depend on scheduling, so runs are reproducible across
/// worker-pool sizes.
fn step_rng(seed: u64, step: u64, walker: u64) -> SmallRng {
    let mut z = seed
        ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ walker.wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    SmallRng::seed_from_u64(z)
}

/// Shrinks the pool toward the decay schedule's target for this step.
///
/// The target is `max(floor, initial − step / decay)`: a strictly
/// non-increasing population that approaches the configured floor as the
/// process runs out of material. Excess walkers are dropped outright —
/// never replaced — and a pool already at or below the target is left
/// untouched.
///
/// ### Parameters
/// - `pool` - The walker pool to resize.
/// - `cfg` - Provides the initial count, floor and decay interval.
/// - `step` - The step counter, already advanced for the current step.
///
/// ### Returns
/// The computed target size.
pub fn population_phase(pool: &mut WalkerPool, cfg: &Config, step: u64) -> usize {
    let removed = usize::try_from(step / u64::from(cfg.decay_steps_per_walker))
        .unwrap_or(usize::MAX);
    let target = cfg
        .initial_walkers
        .saturating_sub(removed)
        .max(cfg.population_floor);

    pool.shrink_to(target);
    target
}

/// Advances every walker one step, in parallel.
///
/// For each walker independently:
///
/// 1. Derive the walker's step generator via (seed, step, index) and
///    draw a candidate position one lazy random-walk displacement away.
/// 2. If the candidate is adjacent to the aggregate, record it in the
///    [`FreezeBuffer`] (the append is the only synchronized section)
///    and report [`WalkerFate::Frozen`]. The freeze check runs first,
///    so a candidate that is both adjacent and out of bounds freezes.
/// 3. Otherwise, if the candidate exceeds the bounds on any axis,
///    report [`WalkerFate::Escaped`] without recording anything.
/// 4. Otherwise the walker moves: [`WalkerFate::Moved`].
///
/// The aggregate is read-only here; every walker writes only its own
/// slot of the returned fate array, which preserves pool order.
///
/// ### Parameters
/// - `pool` - The walkers to advance; not modified.
/// - `aggregate` - The frozen structure; only read access is required.
/// - `cfg` - Provides the bounds radius.
/// - `buf` - Shared pending-freeze list appended to under its lock.
/// - `seed` - Master seed for the run.
/// - `step` - The current step counter.
///
/// ### Returns
/// One [`WalkerFate`] per walker, in pool order.
pub fn walk_phase(
    pool: &WalkerPool,
    aggregate: &AggregateSet,
    cfg: &Config,
    buf: &FreezeBuffer,
    seed: u64,
    step: u64,
) -> Vec<WalkerFate> {
    pool.walkers
        .par_iter()
        .enumerate()
        .map(|(i, walker)| {
            let mut rng = step_rng(seed, step, i as u64);
            let candidate = walker.pos + random_step(&mut rng);

            if aggregate.is_adjacent(candidate) {
                buf.record(i, candidate);
                WalkerFate::Frozen(candidate)
            } else if !within_bounds(candidate, cfg.bounds_radius) {
                WalkerFate::Escaped(candidate)
            } else {
                WalkerFate::Moved(candidate)
            }
        })
        .collect()
}

/// Merges this step's freeze candidates into the aggregate.
///
/// Drains the buffer in walker-index order and inserts each cell that
/// is not already present. Duplicates arise when two walkers freeze
/// onto the same empty cell in the same step; the first (lowest walker
/// index) wins and later copies are skipped. Exactly one
/// [`GrowthEvent`] fires per unique insertion, at the moment of
/// insertion.
///
/// ### Parameters
/// - `aggregate` - The structure to grow; this phase is its only writer.
/// - `buf` - The pending-freeze list filled by [`walk_phase`].
/// - `sink` - Receives one event per newly frozen cell.
///
/// ### Returns
/// The cells frozen this step, in emission order.
pub fn merge_phase(
    aggregate: &mut AggregateSet,
    buf: &FreezeBuffer,
    sink: &mut dyn GrowthSink,
) -> Vec<Cell> {
    let mut frozen = Vec::new();
    for (_, cell) in buf.drain_sorted() {
        if aggregate.insert(cell) {
            sink.on_growth(GrowthEvent { cell });
            frozen.push(cell);
        }
    }
    frozen
}

/// Builds the next walker generation from this step's fates.
///
/// Walkers that moved keep their candidate position; frozen and escaped
/// walkers are replaced by fresh spawns on the bounding cube's faces,
/// drawn from the engine's sequential generator in walker order.
///
/// ### Parameters
/// - `pool` - Receives the next generation; its previous contents are
///   discarded.
/// - `fates` - One fate per walker, as returned by [`walk_phase`].
/// - `bounds` - Half-width of the cubic domain.
/// - `rng` - Sequential generator for respawn positions.
pub fn respawn_phase(
    pool: &mut WalkerPool,
    fates: &[WalkerFate],
    bounds: i32,
    rng: &mut impl Rng,
) {
    pool.walkers = fates
        .iter()
        .map(|fate| match fate {
            WalkerFate::Moved(cell) => Walker::new(*cell),
            WalkerFate::Frozen(_) | WalkerFate::Escaped(_) => Walker::on_boundary(bounds, rng),
        })
        .collect();
}
