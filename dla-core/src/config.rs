use thiserror::Error;

/// Rejected configuration values.
///
/// Construction of an [`crate::engine::AggregationEngine`] fails fast on
/// any of these, so an engine can never exist in an invalid state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The cubic domain must have a positive half-width.
    #[error("bounds_radius must be positive, got {0}")]
    NonPositiveBounds(i32),

    /// The simulation needs at least one walker to do anything.
    #[error("initial_walkers must be at least 1")]
    NoWalkers,

    /// The decay schedule may never empty the pool entirely.
    #[error("population_floor must be at least 1, got {0}")]
    FloorTooLow(usize),

    /// The decay schedule divides the step counter by this value.
    #[error("decay_steps_per_walker must be at least 1")]
    ZeroDecayInterval,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Half-width of the cubic domain, in lattice units.
    pub bounds_radius: i32,
    /// Walker population at startup; the decay schedule only shrinks it.
    pub initial_walkers: usize,
    /// Smallest population the decay schedule may reach.
    pub population_floor: usize,
    /// Number of steps per walker removed by the decay schedule.
    pub decay_steps_per_walker: u32,
    /// Accumulated seconds required before `tick` runs one step.
    pub step_interval: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds_radius: 50,
            initial_walkers: 200,
            population_floor: 5,
            decay_steps_per_walker: 90,
            step_interval: 0.1,
        }
    }
}

impl Config {
    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds_radius <= 0 {
            return Err(ConfigError::NonPositiveBounds(self.bounds_radius));
        }
        if self.initial_walkers == 0 {
            return Err(ConfigError::NoWalkers);
        }
        if self.population_floor < 1 {
            return Err(ConfigError::FloorTooLow(self.population_floor));
        }
        if self.decay_steps_per_walker == 0 {
            return Err(ConfigError::ZeroDecayInterval);
        }
        Ok(())
    }
}
