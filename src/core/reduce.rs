// equivalence resolver: first-fit reduction against the canonical set
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::events::EventKind;
use crate::core::graph::{ComponentGraph, Edge, GraphError};
use crate::core::merge::MergeRecord;
use crate::core::signature::{edge_signature, semantic_signature};
use crate::core::state::{Outcome, Phase};
use crate::core::types::ComponentId;

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    PhaseMismatch,
    EdgeCountMismatch,
    //paired edges at `position` differ by more than epsilon
    WeightDivergence { position: usize, diff: f64 },
    SignatureMismatch,
    AnnotationIncompatible,
}

//edges paired by position after a stable sort on (kind, target)
fn paired_edges(edges: &[Edge]) -> Vec<&Edge> {
    let mut sorted: Vec<&Edge> = edges.iter().collect();
    sorted.sort_by_key(|e| (e.kind, e.target));
    sorted
}

impl ComponentGraph {
    //full equivalence of idx against candidate on their current edges. pure
    pub(crate) fn check_equivalence(&self, idx: usize, candidate: usize) -> Result<(), Rejection> {
        self.compare(
            idx,
            &self.components[idx].edges,
            candidate,
            &self.components[candidate].edges,
        )
    }

    //same check, restricted to the edges each side had when it was promoted.
    //edges added later by resolve are not part of the reduction decision
    pub(crate) fn check_equivalence_as_reduced(
        &self,
        idx: usize,
        candidate: usize,
    ) -> Result<(), Rejection> {
        self.compare(
            idx,
            self.edges_at_reduction(idx),
            candidate,
            self.edges_at_reduction(candidate),
        )
    }

    fn edges_at_reduction(&self, idx: usize) -> &[Edge] {
        let edges = &self.components[idx].edges;
        let n = self.reduced_edges.get(&idx).copied().unwrap_or(edges.len());
        &edges[..n.min(edges.len())]
    }

    //order: phase, edge count, paired weights within epsilon, signatures,
    //activation compatibility of shared keys
    fn compare(
        &self,
        idx: usize,
        ours: &[Edge],
        candidate: usize,
        theirs: &[Edge],
    ) -> Result<(), Rejection> {
        let c = &self.components[idx];
        let cand = &self.components[candidate];

        if c.phase != cand.phase {
            return Err(Rejection::PhaseMismatch);
        }
        if ours.len() != theirs.len() {
            return Err(Rejection::EdgeCountMismatch);
        }

        let pairs = paired_edges(ours).into_iter().zip(paired_edges(theirs));
        for (position, (a, b)) in pairs.enumerate() {
            let diff = (a.weight.get() - b.weight.get()).abs();
            if diff > self.policy.epsilon {
                return Err(Rejection::WeightDivergence { position, diff });
            }
        }

        let buckets = self.policy.weight_buckets;
        if edge_signature(ours, buckets) != edge_signature(theirs, buckets)
            || semantic_signature(c) != semantic_signature(cand)
        {
            return Err(Rejection::SignatureMismatch);
        }

        //same key set is guaranteed by the semantic signature
        for theirs in cand.annotations.iter() {
            let Some(ours) = c.annotations.get(&theirs.key) else {
                return Err(Rejection::AnnotationIncompatible);
            };
            if let (Some(a), Some(b)) = (ours.activation, theirs.activation) {
                if !a.same_as(&b) {
                    return Err(Rejection::AnnotationIncompatible);
                }
            }
        }

        Ok(())
    }

    pub fn explain_rejection(
        &self,
        id: ComponentId,
        candidate: ComponentId,
    ) -> Result<Option<Rejection>, GraphError> {
        let idx = self.idx_of(id)?;
        let cand = self.idx_of(candidate)?;
        Ok(self.check_equivalence(idx, cand).err())
    }

    /// Reduce one component against the canonical set, first fit in promotion
    /// order. Returns the canonical form that now stands for it.
    pub fn reduce(&mut self, id: ComponentId) -> Result<ComponentId, GraphError> {
        let idx = self.idx_of(id)?;

        if self.canonical.contains_key(&idx) {
            let canon = self.resolve_canonical(idx)?;
            tracing::trace!(component = id, canonical = self.components[canon].id, "already reduced");
            return Ok(self.components[canon].id);
        }

        self.components[idx].phase = Phase::Active;

        //weight divergences are only charged once the attempt commits
        let mut prevented = Vec::new();
        let mut accepted = None;
        for &candidate in &self.canonical_set {
            let cand_id = self.components[candidate].id;

            match self.check_equivalence(idx, candidate) {
                Ok(()) => {
                    accepted = Some(candidate);
                    break;
                }
                Err(Rejection::WeightDivergence { position, diff }) => {
                    tracing::debug!(
                        component = id,
                        candidate = cand_id,
                        position,
                        diff,
                        "edge weights diverge, merge prevented"
                    );
                    prevented.push(candidate);
                }
                Err(reason) => {
                    tracing::trace!(component = id, candidate = cand_id, ?reason, "candidate rejected");
                }
            }
        }

        match accepted {
            Some(candidate) => self.accept_merge(idx, candidate, &prevented),
            None => {
                self.record_prevented(idx, &prevented);
                self.promote(idx)
            }
        }
    }

    fn record_prevented(&mut self, idx: usize, candidates: &[usize]) {
        let id = self.components[idx].id;
        for &candidate in candidates {
            let cand_id = self.components[candidate].id;
            self.record_outcome(candidate, Outcome::Prevented);
            self.events.append(id, cand_id, None, EventKind::FalsePositiveAvoided);
        }
    }

    fn accept_merge(
        &mut self,
        idx: usize,
        candidate: usize,
        prevented: &[usize],
    ) -> Result<ComponentId, GraphError> {
        let (id, cand_id) = (self.components[idx].id, self.components[candidate].id);

        let report = match self.merge_annotations_at(candidate, idx) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(component = id, candidate = cand_id, error = %e, "merge aborted");
                self.components[idx].phase = Phase::Dormant;
                return Err(e);
            }
        };

        self.record_prevented(idx, prevented);
        self.set_canonical(idx, candidate)?;
        self.components[idx].phase = Phase::Archived;
        self.record_outcome(candidate, Outcome::TruePositive);

        self.merges.push(MergeRecord {
            absorbed: id,
            canonical: cand_id,
            added_keys: report.added,
            conflicted_keys: report.conflicts,
        });
        self.events.append(id, cand_id, None, EventKind::Merged);

        tracing::debug!(component = id, canonical = cand_id, "component reduced");
        Ok(cand_id)
    }

    fn promote(&mut self, idx: usize) -> Result<ComponentId, GraphError> {
        let id = self.components[idx].id;

        self.set_canonical(idx, idx)?;
        self.canonical_set.push(idx);
        self.reduced_edges.insert(idx, self.components[idx].edges.len());
        self.components[idx].phase = Phase::Active;
        self.record_outcome(idx, Outcome::TrueNegative);
        self.events.append(id, id, None, EventKind::Promoted);

        tracing::debug!(component = id, "component promoted to canonical");
        Ok(id)
    }

    //checks `cancel` before each component
    pub fn reduce_all(&mut self, cancel: &AtomicBool) -> Result<usize, GraphError> {
        let mut processed = 0;

        for idx in 0..self.components.len() {
            if self.components[idx].phase != Phase::Dormant {
                continue;
            }
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(processed, "reduction cancelled");
                return Err(GraphError::Cancelled { processed });
            }

            let id = self.components[idx].id;
            self.reduce(id)?;
            processed += 1;
        }

        tracing::info!(
            processed,
            canonical = self.canonical_set.len(),
            merges = self.merges.len(),
            "reduction complete"
        );
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::Component;
    use crate::core::policy::LinkPolicy;
    use crate::core::types::{Activation, Annotation, Context, ReferenceKind, Weight};

    fn w(v: f64) -> Weight {
        Weight::new(v).unwrap()
    }

    fn mk_component(id: ComponentId, weights: &[f64], keys: &[&str]) -> Component {
        let mut c = Component::new(id);
        for (i, &v) in weights.iter().enumerate() {
            c = c.with_edge(100 + i as u32, ReferenceKind::Direct, w(v));
        }
        for key in keys {
            c = c.with_annotation(Annotation::anchor(*key));
        }
        c
    }

    fn run(g: &mut ComponentGraph) {
        g.reduce_all(&AtomicBool::new(false)).unwrap();
    }

    #[test]
    fn empty_canonical_set_promotes() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[0.5], &["a"])).unwrap();

        assert_eq!(g.reduce(1).unwrap(), 1);
        assert!(g.is_canonical(1).unwrap());
        assert_eq!(g.component(1).unwrap().phase, Phase::Active);
        assert_eq!(g.component(1).unwrap().outcomes.get(Outcome::TrueNegative), 1);
    }

    #[test]
    fn equivalent_component_is_absorbed_and_residues_survive() {
        let mut g = ComponentGraph::new();
        let a = Component::new(1)
            .with_edge(9, ReferenceKind::Virtual, w(0.3))
            .with_annotation(Annotation::new("k", Context::Symbol("from-a".into())));
        let b = Component::new(2)
            .with_edge(8, ReferenceKind::Virtual, w(0.3005))
            .with_annotation(Annotation::new("k", Context::Symbol("from-b".into())));
        g.add_components([a, b]).unwrap();
        let b_before = g.component(2).unwrap().annotations.clone();

        run(&mut g);

        assert_eq!(g.canonical_of(2).unwrap(), 1);
        assert_eq!(g.component(2).unwrap().phase, Phase::Archived);
        assert!(g.component(1).unwrap().annotations.covers(&b_before));
        assert_eq!(g.component(1).unwrap().outcomes.get(Outcome::TruePositive), 1);
    }

    #[test]
    fn weight_divergence_is_recorded_as_prevented_on_candidate() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[0.5], &["a"])).unwrap();
        g.add_component(mk_component(2, &[0.502], &["a"])).unwrap();

        run(&mut g);

        assert_eq!(g.canonical_ids(), vec![1, 2]);
        let a = g.component(1).unwrap();
        assert_eq!(a.outcomes.get(Outcome::Prevented), 1);
        assert_eq!(a.outcomes.get(Outcome::FalsePositive), 0);
        assert!(g
            .events()
            .iter()
            .any(|e| e.kind == EventKind::FalsePositiveAvoided && e.target == 1));
    }

    #[test]
    fn weights_exactly_epsilon_apart_still_merge() {
        //single bucket so only the epsilon rule decides
        let policy = LinkPolicy {
            epsilon: 0.25,
            weight_buckets: 1,
            ..LinkPolicy::default()
        };
        let mut g = ComponentGraph::with_policy(policy).unwrap();
        g.add_component(mk_component(1, &[0.5], &[])).unwrap();
        g.add_component(mk_component(2, &[0.75], &[])).unwrap();

        run(&mut g);

        assert_eq!(g.canonical_of(2).unwrap(), 1);
    }

    #[test]
    fn explain_rejection_reports_first_failing_check() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[0.5], &["a"])).unwrap();
        g.add_component(mk_component(2, &[0.5, 0.5], &["a"])).unwrap();
        g.add_component(mk_component(3, &[0.5], &["b"])).unwrap();
        g.add_component(mk_component(4, &[0.5], &["a"])).unwrap();

        //all Dormant, phases agree
        assert_eq!(
            g.explain_rejection(2, 1).unwrap(),
            Some(Rejection::EdgeCountMismatch)
        );
        assert_eq!(
            g.explain_rejection(3, 1).unwrap(),
            Some(Rejection::SignatureMismatch)
        );
        assert_eq!(g.explain_rejection(4, 1).unwrap(), None);

        g.reduce(1).unwrap();
        assert_eq!(
            g.explain_rejection(4, 1).unwrap(),
            Some(Rejection::PhaseMismatch)
        );
    }

    #[test]
    fn edge_count_or_keys_mismatch_promotes() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[0.5], &["a"])).unwrap();
        g.add_component(mk_component(2, &[0.5, 0.5], &["a"])).unwrap();
        g.add_component(mk_component(3, &[0.5], &["b"])).unwrap();

        run(&mut g);

        assert_eq!(g.canonical_ids(), vec![1, 2, 3]);
        assert_eq!(g.ledger().false_positive, 0);
        assert_eq!(g.ledger().true_negative, 3);
    }

    #[test]
    fn differing_activation_predicates_are_incompatible() {
        let mut g = ComponentGraph::new();
        g.add_component(Component::new(1).with_annotation(
            Annotation::anchor("sym").with_activation(Activation::Fixed(w(0.9))),
        ))
        .unwrap();
        g.add_component(
            Component::new(2).with_annotation(Annotation::anchor("sym").with_activation(Activation::Score)),
        )
        .unwrap();

        run(&mut g);

        assert!(g.is_canonical(2).unwrap());
    }

    #[test]
    fn first_fit_uses_promotion_order() {
        //1 and 2 are too far apart to merge, 3 is within epsilon of both
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[0.4000], &["a"])).unwrap();
        g.add_component(mk_component(2, &[0.4015], &["a"])).unwrap();
        g.add_component(mk_component(3, &[0.4008], &["a"])).unwrap();

        run(&mut g);

        assert_eq!(g.canonical_ids(), vec![1, 2]);
        assert_eq!(g.canonical_of(3).unwrap(), 1);
        assert_eq!(g.component(2).unwrap().outcomes.get(Outcome::TruePositive), 0);
    }

    #[test]
    fn reducing_a_canonical_component_again_is_a_no_op() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[], &["core"])).unwrap();
        g.add_component(mk_component(2, &[], &["core"])).unwrap();
        run(&mut g);
        let before = g.ledger();
        let events = g.events().len();

        assert_eq!(g.reduce(1).unwrap(), 1);
        assert_eq!(g.reduce(2).unwrap(), 1);

        assert_eq!(g.ledger(), before);
        assert_eq!(g.events().len(), events);
        assert_eq!(g.canonical_ids(), vec![1]);
    }

    #[test]
    fn duplicates_of_distinct_canonicals_yield_only_true_positives() {
        let mut g = ComponentGraph::new();
        let n = 5u32;
        for i in 0..n {
            g.add_component(mk_component(i, &[0.1 * (i + 1) as f64], &["shared"]))
                .unwrap();
        }
        run(&mut g);
        let base = g.ledger();

        let m = 8u32;
        for j in 0..m {
            let of = j % n;
            g.add_component(mk_component(1000 + j, &[0.1 * (of + 1) as f64], &["shared"]))
                .unwrap();
        }
        run(&mut g);

        let ledger = g.ledger();
        assert_eq!(ledger.true_positive - base.true_positive, m as u64);
        assert_eq!(ledger.false_positive, 0);
        assert_eq!(g.canonical_ids().len(), n as usize);
    }

    #[test]
    fn failed_merge_leaves_state_untouched_and_retry_counts_once() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[0.502], &["a"])).unwrap();
        g.add_component(mk_component(2, &[0.5], &["a"])).unwrap();
        g.add_component(
            Component::new(3)
                .with_edge(100, ReferenceKind::Direct, w(0.5))
                .with_annotation(Annotation::new("a", Context::Symbol("three".into()))),
        )
        .unwrap();
        g.reduce(1).unwrap();
        g.reduce(2).unwrap();
        assert_eq!(g.component(1).unwrap().outcomes.get(Outcome::Prevented), 1);
        let before = g.component(2).unwrap().annotations.get("a").unwrap().contexts.clone();

        g.fail_merges = true;
        let err = g.reduce(3).unwrap_err();

        assert!(matches!(err, GraphError::MergeAllocation(_)));
        let c = g.component(3).unwrap();
        assert_eq!(c.phase, Phase::Dormant);
        assert_eq!(g.absorbed_by(3).unwrap(), None);
        assert!(!g.canonical_ids().contains(&3));
        assert_eq!(g.component(2).unwrap().annotations.get("a").unwrap().contexts, before);
        assert_eq!(g.component(2).unwrap().outcomes.get(Outcome::TruePositive), 0);
        assert_eq!(g.component(1).unwrap().outcomes.get(Outcome::Prevented), 1);

        g.fail_merges = false;
        assert_eq!(g.reduce(3).unwrap(), 2);

        assert_eq!(g.component(1).unwrap().outcomes.get(Outcome::Prevented), 2);
        let avoided = g
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::FalsePositiveAvoided && e.target == 1)
            .count();
        assert_eq!(avoided, 2);
        assert_eq!(g.component(3).unwrap().phase, Phase::Archived);
    }

    #[test]
    fn reduce_all_honours_cancellation() {
        let mut g = ComponentGraph::new();
        g.add_component(mk_component(1, &[], &[])).unwrap();
        g.add_component(mk_component(2, &[], &[])).unwrap();

        let err = g.reduce_all(&AtomicBool::new(true)).unwrap_err();
        assert!(matches!(err, GraphError::Cancelled { processed: 0 }));
        assert_eq!(g.component(1).unwrap().phase, Phase::Dormant);
        assert!(g.canonical_ids().is_empty());
    }
}
