use crate::types::Cell;
use glam::IVec3;
use rand::Rng;

/// A single mobile agent performing a lazy random walk.
///
/// Walkers are replaced rather than mutated when they freeze onto the
/// aggregate or escape the bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Walker {
    pub pos: Cell,
}

impl Walker {
    pub fn new(pos: Cell) -> Self {
        Self { pos }
    }

    /// Spawns a fresh walker on a random face of the bounding cube.
    pub fn on_boundary(bounds: i32, rng: &mut impl Rng) -> Self {
        Self::new(sample_face_position(bounds, rng))
    }
}

/// Samples a position uniformly on the faces of the bounding cube.
///
/// One axis is chosen uniformly at random and pinned to `±bounds` (coin
/// flip for the sign); the other two axes are independent uniform
/// integers in `[-bounds, bounds]`. The result always lies on a face,
/// never strictly inside the domain.
pub fn sample_face_position(bounds: i32, rng: &mut impl Rng) -> Cell {
    let axis = rng.random_range(0..3);
    let side = if rng.random_bool(0.5) { bounds } else { -bounds };

    let mut pos = IVec3::ZERO;
    for i in 0..3 {
        pos[i] = if i == axis {
            side
        } else {
            rng.random_range(-bounds..=bounds)
        };
    }
    pos
}

/// Draws one lazy random-walk displacement.
///
/// Each component is drawn independently and uniformly from {-1, 0, 1},
/// so the zero displacement is a valid outcome and there is no bias
/// toward the origin.
pub fn random_step(rng: &mut impl Rng) -> IVec3 {
    IVec3::new(
        rng.random_range(-1..=1),
        rng.random_range(-1..=1),
        rng.random_range(-1..=1),
    )
}

/// The live, ordered collection of walkers.
#[derive(Debug)]
pub struct WalkerPool {
    pub walkers: Vec<Walker>,
}

impl WalkerPool {
    /// Populates a pool of `count` walkers spawned on the cube faces.
    pub fn spawn_on_faces(count: usize, bounds: i32, rng: &mut impl Rng) -> Self {
        let walkers = (0..count).map(|_| Walker::on_boundary(bounds, rng)).collect();
        Self { walkers }
    }

    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }

    /// Shrinks the pool to `target` walkers by dropping the tail.
    ///
    /// Resizing is shrink-only: a target at or above the current size
    /// leaves the pool untouched.
    pub fn shrink_to(&mut self, target: usize) {
        if self.walkers.len() > target {
            self.walkers.truncate(target);
        }
    }
}
