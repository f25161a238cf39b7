// append-only log of linking decisions
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::core::graph::ComponentGraph;
use crate::core::types::{ComponentId, Weight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Promoted,
    Merged,
    MergeConflict,
    FalsePositiveAvoided,
    IndirectLink,
    Unresolved,
    FalsePositiveReported,
    FalseNegativeReported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkEvent {
    //logical clock
    pub seq: u64,
    pub timestamp_ms: u64,
    pub source: ComponentId,
    pub target: ComponentId,
    pub weight: Option<Weight>,
    pub kind: EventKind,
}

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LinkEvent>,
    next_seq: u64,
}

impl EventLog {
    pub fn append(
        &mut self,
        source: ComponentId,
        target: ComponentId,
        weight: Option<Weight>,
        kind: EventKind,
    ) {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        self.events.push(LinkEvent {
            seq: self.next_seq,
            timestamp_ms,
            source,
            target,
            weight,
            kind,
        });
        self.next_seq += 1;
    }

    pub fn as_slice(&self) -> &[LinkEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl ComponentGraph {
    pub fn events(&self) -> &[LinkEvent] {
        self.events.as_slice()
    }

    pub fn events_for(&self, id: ComponentId) -> impl Iterator<Item = &LinkEvent> + '_ {
        self.events
            .as_slice()
            .iter()
            .filter(move |e| e.source == id || e.target == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_increasing_sequence_numbers() {
        let mut log = EventLog::default();
        log.append(1, 2, None, EventKind::Merged);
        log.append(3, 3, None, EventKind::Promoted);
        log.append(1, 3, Some(Weight::new(0.7).unwrap()), EventKind::IndirectLink);

        let seqs: Vec<u64> = log.as_slice().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.as_slice()[2].weight.unwrap().get(), 0.7);
    }
}
