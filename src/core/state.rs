// component lifecycle phase + per-component outcome counters
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Dormant,
    Active,
    Transforming,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    TruePositive,
    TrueNegative,
    FalsePositive,
    FalseNegative,
    //weight divergence caught before merging
    Prevented,
}

//monotone, only `record` mutates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Outcomes {
    true_positive: u64,
    true_negative: u64,
    false_positive: u64,
    false_negative: u64,
    prevented: u64,
}

impl Outcomes {
    pub fn record(&mut self, outcome: Outcome) {
        let slot = match outcome {
            Outcome::TruePositive => &mut self.true_positive,
            Outcome::TrueNegative => &mut self.true_negative,
            Outcome::FalsePositive => &mut self.false_positive,
            Outcome::FalseNegative => &mut self.false_negative,
            Outcome::Prevented => &mut self.prevented,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::TruePositive => self.true_positive,
            Outcome::TrueNegative => self.true_negative,
            Outcome::FalsePositive => self.false_positive,
            Outcome::FalseNegative => self.false_negative,
            Outcome::Prevented => self.prevented,
        }
    }
}
