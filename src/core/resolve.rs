// indirect reference resolution by annotation key
use serde::Serialize;

use crate::core::events::EventKind;
use crate::core::graph::{ComponentGraph, Edge, GraphError};
use crate::core::state::{Outcome, Phase};
use crate::core::types::{ComponentId, ReferenceKind, Weight};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub source: ComponentId,
    pub name: String,
}

impl ComponentGraph {
    //first canonical form (promotion order) carrying `name` with an activation
    //at or above the threshold. read-only
    fn find_indirect_target(&self, name: &str) -> Result<Option<(usize, Weight)>, GraphError> {
        for &idx in &self.canonical_set {
            let Some(annotation) = self.components[idx].annotations.get(name) else {
                continue;
            };
            if let Some(activation) = annotation.activation_value()? {
                if activation.get() >= self.policy.activation_threshold {
                    return Ok(Some((idx, activation)));
                }
                tracing::trace!(
                    candidate = self.components[idx].id,
                    reference = name,
                    activation = activation.get(),
                    "activation below threshold"
                );
            }
        }
        Ok(None)
    }

    /// Resolve `name` from `source` to a canonical form, adding an `Indirect`
    /// edge on a match. `Ok(None)` means unresolved.
    pub fn resolve(
        &mut self,
        source: ComponentId,
        name: &str,
    ) -> Result<Option<ComponentId>, GraphError> {
        let src = self.idx_of(source)?;

        let prior = self.components[src].phase;
        self.components[src].phase = Phase::Transforming;
        let found = self.find_indirect_target(name);
        self.components[src].phase = prior;

        match found? {
            Some((target_idx, activation)) => {
                let target = self.components[target_idx].id;
                self.components[src].edges.push(Edge {
                    source,
                    target,
                    kind: ReferenceKind::Indirect,
                    weight: activation,
                });
                self.record_outcome(src, Outcome::TruePositive);
                self.events
                    .append(source, target, Some(activation), EventKind::IndirectLink);

                tracing::debug!(
                    source,
                    resolved_to = target,
                    reference = name,
                    activation = activation.get(),
                    "indirect reference resolved"
                );
                Ok(Some(target))
            }
            None => {
                self.record_outcome(src, Outcome::TrueNegative);
                self.unresolved.push(UnresolvedReference {
                    source,
                    name: name.to_string(),
                });
                self.events.append(source, source, None, EventKind::Unresolved);

                tracing::debug!(source, reference = name, "indirect reference unresolved");
                Ok(None)
            }
        }
    }

    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }
}
