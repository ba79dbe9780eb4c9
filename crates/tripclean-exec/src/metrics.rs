//! Per-stage row counters, reported through `tracing` at the end of a run.

use tripclean_core::id::OpId;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct StageCounters {
    stages: Vec<StageRows>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRows {
    pub op: OpId,
    pub name: &'static str,
    pub rows_in: u64,
    pub rows_out: u64,
}

impl StageCounters {
    pub fn register(&mut self, op: OpId, name: &'static str) {
        self.stages.push(StageRows {
            op,
            name,
            rows_in: 0,
            rows_out: 0,
        });
    }

    /// Record one block through stage `idx` (registration order).
    pub fn record(&mut self, idx: usize, rows_in: usize, rows_out: usize) {
        if let Some(s) = self.stages.get_mut(idx) {
            s.rows_in += rows_in as u64;
            s.rows_out += rows_out as u64;
        }
    }

    pub fn stages(&self) -> &[StageRows] {
        &self.stages
    }

    pub fn emit(&self) {
        for s in &self.stages {
            debug!(op = %s.op, stage = s.name, rows_in = s.rows_in, rows_out = s.rows_out, "stage totals");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_stage() {
        let mut c = StageCounters::default();
        c.register(OpId::new(1), "map");
        c.register(OpId::new(2), "filter");
        c.record(0, 10, 10);
        c.record(1, 10, 7);
        c.record(1, 5, 5);
        c.record(9, 1, 1);
        assert_eq!(c.stages()[1].rows_in, 15);
        assert_eq!(c.stages()[1].rows_out, 12);
        assert_eq!(c.stages()[0].rows_out, 10);
    }
}
