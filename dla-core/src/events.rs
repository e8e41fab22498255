use crate::types::Cell;

/// Emitted exactly once per cell, the instant it is accepted into the
/// aggregate. The core keeps no state about an event after emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthEvent {
    pub cell: Cell,
}

/// Consumer of growth events, e.g. a renderer's instance bookkeeping.
///
/// Events arrive in emission order: within one step, unique cells fire
/// in walker-index order, and a cell never fires twice.
pub trait GrowthSink {
    fn on_growth(&mut self, event: GrowthEvent);
}

/// Queue form: collect events for later draining.
impl GrowthSink for Vec<GrowthEvent> {
    fn on_growth(&mut self, event: GrowthEvent) {
        self.push(event);
    }
}

/// Discards every event; for driving the engine when nobody renders.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl GrowthSink for NullSink {
    fn on_growth(&mut self, _event: GrowthEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_events_in_order() {
        let first = GrowthEvent {
            cell: Cell::new(1, 2, 3),
        };
        let second = GrowthEvent {
            cell: Cell::new(-1, 0, 4),
        };

        let mut queue: Vec<GrowthEvent> = Vec::new();
        queue.on_growth(first);
        queue.on_growth(second);
        assert_eq!(queue, vec![first, second]);

        NullSink.on_growth(first);
    }
}
