use glam::IVec3;

/// Position of one voxel in the integer lattice.
///
/// Equality and hashing are by exact coordinate, so a `Cell` identifies
/// one lattice position and nothing else.
pub type Cell = IVec3;

/// Returns `true` when `cell` lies inside the cubic domain with the
/// given half-width, faces inclusive.
#[inline]
pub fn within_bounds(cell: Cell, bounds: i32) -> bool {
    cell.abs().max_element() <= bounds
}
