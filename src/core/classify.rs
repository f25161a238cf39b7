// post-run classification audit
use crate::core::events::EventKind;
use crate::core::graph::ComponentGraph;
use crate::core::state::Outcome;

impl ComponentGraph {
    //Re-check every decision the reduction made:
    // - absorbed component whose residues are not all held by its canonical form -> false positive
    //   on the canonical form (the merge lost information)
    // - two canonical forms that are still fully equivalent -> false negative on the later one
    //   (the merge should have happened)
    //Each pair is charged at most once, so auditing twice does not double count.
    pub fn audit(&mut self) -> (u64, u64) {
        let mut false_positives = 0;
        let mut false_negatives = 0;

        for idx in 0..self.components.len() {
            let Some(&canon) = self.canonical.get(&idx) else {
                continue;
            };
            if canon == idx || self.audited.contains(&(canon, idx)) {
                continue;
            }
            if self.components[canon]
                .annotations
                .covers(&self.components[idx].annotations)
            {
                continue;
            }

            let (id, canon_id) = (self.components[idx].id, self.components[canon].id);
            tracing::warn!(component = id, canonical = canon_id, "absorbed residues missing from canonical form");
            self.audited.insert((canon, idx));
            self.record_outcome(canon, Outcome::FalsePositive);
            self.events.append(id, canon_id, None, EventKind::FalsePositiveReported);
            false_positives += 1;
        }

        let canonical_set = self.canonical_set.clone();
        for (pos, &later) in canonical_set.iter().enumerate() {
            for &earlier in &canonical_set[..pos] {
                if self.audited.contains(&(earlier, later)) {
                    continue;
                }
                if self.check_equivalence_as_reduced(later, earlier).is_err() {
                    continue;
                }

                let (id, other_id) = (self.components[later].id, self.components[earlier].id);
                tracing::warn!(component = id, equivalent_to = other_id, "canonical forms left unmerged");
                self.audited.insert((earlier, later));
                self.record_outcome(later, Outcome::FalseNegative);
                self.events.append(id, other_id, None, EventKind::FalseNegativeReported);
                false_negatives += 1;
            }
        }

        (false_positives, false_negatives)
    }
}
