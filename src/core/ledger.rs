// outcome ledger: aggregate of per-component counters
use serde::Serialize;

use crate::core::events::EventKind;
use crate::core::graph::{ComponentGraph, GraphError};
use crate::core::state::{Outcome, Outcomes};
use crate::core::types::ComponentId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeLedger {
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub prevented: u64,
}

impl OutcomeLedger {
    fn add(&mut self, o: &Outcomes) {
        self.true_positive += o.get(Outcome::TruePositive);
        self.true_negative += o.get(Outcome::TrueNegative);
        self.false_positive += o.get(Outcome::FalsePositive);
        self.false_negative += o.get(Outcome::FalseNegative);
        self.prevented += o.get(Outcome::Prevented);
    }

    pub fn is_clean(&self) -> bool {
        self.false_positive == 0
    }
}

impl ComponentGraph {
    pub(crate) fn record_outcome(&mut self, idx: usize, outcome: Outcome) {
        let c = &mut self.components[idx];
        c.outcomes.record(outcome);
        tracing::trace!(component = c.id, ?outcome, "outcome recorded");
    }

    pub fn ledger(&self) -> OutcomeLedger {
        let mut ledger = OutcomeLedger::default();
        for c in &self.components {
            ledger.add(&c.outcomes);
        }
        ledger
    }

    //consumer feedback
    pub fn report_false_positive(&mut self, id: ComponentId) -> Result<(), GraphError> {
        let idx = self.idx_of(id)?;
        self.record_outcome(idx, Outcome::FalsePositive);
        self.events.append(id, id, None, EventKind::FalsePositiveReported);
        tracing::warn!(component = id, "false positive reported");
        Ok(())
    }

    pub fn report_false_negative(&mut self, id: ComponentId) -> Result<(), GraphError> {
        let idx = self.idx_of(id)?;
        self.record_outcome(idx, Outcome::FalseNegative);
        self.events.append(id, id, None, EventKind::FalseNegativeReported);
        tracing::info!(component = id, "false negative reported");
        Ok(())
    }
}
