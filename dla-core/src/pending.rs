use crate::types::Cell;
use std::sync::Mutex;

/// Pending-insert list shared by the parallel walk phase.
///
/// Workers that detect a freeze append `(walker index, candidate cell)`
/// here; this append is the only synchronized section of a step, and the
/// lock is held only for the push itself — never across the adjacency
/// query.
///
/// Append order under contention is scheduling-dependent, so
/// [`FreezeBuffer::drain_sorted`] hands the entries to the merge phase
/// in walker-index order. That makes the merge — and therefore the
/// emitted event sequence — identical across runs and worker counts.
#[derive(Debug, Default)]
pub struct FreezeBuffer {
    entries: Mutex<Vec<(usize, Cell)>>,
}

impl FreezeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one freeze candidate under the lock.
    pub fn record(&self, walker: usize, cell: Cell) {
        self.entries
            .lock()
            .expect("freeze buffer lock poisoned")
            .push((walker, cell));
    }

    /// Empties the buffer, returning entries sorted by walker index.
    pub fn drain_sorted(&self) -> Vec<(usize, Cell)> {
        let mut entries = std::mem::take(
            &mut *self.entries.lock().expect("freeze buffer lock poisoned"),
        );
        entries.sort_unstable_by_key(|&(walker, _)| walker);
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .expect("freeze buffer lock poisoned")
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_entries_in_walker_order() {
        let buf = FreezeBuffer::new();
        buf.record(2, Cell::new(2, 0, 0));
        buf.record(0, Cell::new(0, 0, 0));
        buf.record(1, Cell::new(1, 0, 0));

        let drained = buf.drain_sorted();
        assert_eq!(
            drained,
            vec![
                (0, Cell::new(0, 0, 0)),
                (1, Cell::new(1, 0, 0)),
                (2, Cell::new(2, 0, 0)),
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_on_empty_buffer_yields_nothing() {
        let buf = FreezeBuffer::new();
        assert!(buf.drain_sorted().is_empty());
    }

    #[test]
    fn concurrent_appends_are_all_retained() {
        let buf = FreezeBuffer::new();

        std::thread::scope(|scope| {
            for t in 0..8 {
                let buf = &buf;
                scope.spawn(move || {
                    for i in 0..100 {
                        buf.record(t * 100 + i, Cell::new(t as i32, i as i32, 0));
                    }
                });
            }
        });

        let drained = buf.drain_sorted();
        assert_eq!(drained.len(), 800);
        // Sorted and free of duplicates: indices are exactly 0..800.
        for (expected, &(walker, _)) in drained.iter().enumerate() {
            assert_eq!(walker, expected);
        }
    }
}
