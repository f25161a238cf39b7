use crate::core::graph::{ComponentGraph, GraphError};
use crate::manifest::{Absorption, LinkManifest, Verdict};

impl ComponentGraph {
    //snapshot as it stands, no audit
    pub fn manifest(&self) -> LinkManifest {
        let ledger = self.ledger();
        LinkManifest {
            canonical: self.canonical_ids(),
            absorbed: self
                .iter_absorbed()
                .map(|(component, canonical)| Absorption { component, canonical })
                .collect(),
            merges: self.merges.clone(),
            unresolved: self.unresolved.clone(),
            ledger,
            verdict: if ledger.is_clean() {
                Verdict::Pass
            } else {
                Verdict::Fail
            },
        }
    }

    /// Audit every decision, then produce the manifest. Fails with
    /// `GraphError::FalsePositives` when the policy aborts on them.
    pub fn finalize(&mut self) -> Result<LinkManifest, GraphError> {
        let (fp, fn_) = self.audit();
        if fp > 0 || fn_ > 0 {
            tracing::warn!(false_positives = fp, false_negatives = fn_, "audit flagged decisions");
        }

        let manifest = self.manifest();
        let ledger = &manifest.ledger;
        tracing::info!(
            canonical = manifest.canonical.len(),
            absorbed = manifest.absorbed.len(),
            unresolved = manifest.unresolved.len(),
            true_positive = ledger.true_positive,
            true_negative = ledger.true_negative,
            false_positive = ledger.false_positive,
            false_negative = ledger.false_negative,
            prevented = ledger.prevented,
            verdict = ?manifest.verdict,
            "link run finalized"
        );

        if manifest.verdict == Verdict::Fail && self.policy.abort_on_false_positive {
            return Err(GraphError::FalsePositives {
                count: ledger.false_positive,
            });
        }
        Ok(manifest)
    }
}
