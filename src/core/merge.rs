// lossless annotation merge
use serde::Serialize;

use crate::core::events::EventKind;
use crate::core::graph::{ComponentGraph, GraphError};
use crate::core::state::Phase;
use crate::core::types::{Annotation, AnnotationSet, ComponentId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: Vec<String>,
    //contexts differed, both kept
    pub conflicts: Vec<String>,
    pub deduplicated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRecord {
    pub absorbed: ComponentId,
    pub canonical: ComponentId,
    pub added_keys: Vec<String>,
    pub conflicted_keys: Vec<String>,
}

impl AnnotationSet {
    pub fn insert(&mut self, annotation: Annotation) {
        match self.entries.get_mut(&annotation.key) {
            None => {
                self.entries.insert(annotation.key.clone(), annotation);
            }
            Some(ours) => {
                for ctx in annotation.contexts {
                    if !ours.contexts.contains(&ctx) {
                        ours.contexts.push(ctx);
                    }
                }
                if ours.activation.is_none() {
                    ours.activation = annotation.activation;
                }
            }
        }
    }

    /// Union `from` into `self`, keeping every distinct context. On error `self`
    /// is unchanged.
    pub fn merge_from(&mut self, from: &AnnotationSet) -> Result<MergeReport, GraphError> {
        let mut staged = self.entries.clone();
        let mut report = MergeReport::default();

        for theirs in from.iter() {
            match staged.get_mut(&theirs.key) {
                None => {
                    staged.insert(theirs.key.clone(), theirs.clone());
                    report.added.push(theirs.key.clone());
                }
                Some(ours) => {
                    let mut conflicted = false;
                    for ctx in &theirs.contexts {
                        if ours.contexts.contains(ctx) {
                            report.deduplicated += 1;
                            continue;
                        }
                        ours.contexts.try_reserve(1)?;
                        ours.contexts.push(ctx.clone());
                        conflicted = true;
                    }
                    if ours.activation.is_none() {
                        ours.activation = theirs.activation;
                    }
                    if conflicted {
                        report.conflicts.push(theirs.key.clone());
                    }
                }
            }
        }

        self.entries = staged;
        Ok(report)
    }
}

impl ComponentGraph {
    pub fn merge_annotations(
        &mut self,
        into: ComponentId,
        from: ComponentId,
    ) -> Result<MergeReport, GraphError> {
        let into_idx = self.idx_of(into)?;
        let from_idx = self.idx_of(from)?;
        //an absorbed component must stay covered by its canonical form
        if self.components[into_idx].phase == Phase::Archived {
            return Err(GraphError::ComponentArchived(into));
        }
        self.merge_annotations_at(into_idx, from_idx)
    }

    pub(crate) fn merge_annotations_at(
        &mut self,
        into_idx: usize,
        from_idx: usize,
    ) -> Result<MergeReport, GraphError> {
        if into_idx == from_idx {
            return Ok(MergeReport::default());
        }

        #[cfg(test)]
        if self.fail_merges {
            let err = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
            return Err(GraphError::MergeAllocation(err));
        }

        let source = self.components[from_idx].annotations.clone();
        let (into_id, from_id) = (self.components[into_idx].id, self.components[from_idx].id);
        let report = self.components[into_idx].annotations.merge_from(&source)?;

        for key in &report.conflicts {
            tracing::debug!(
                into = into_id,
                from = from_id,
                key = %key,
                "annotation contexts differ, keeping both"
            );
            self.events.append(from_id, into_id, None, EventKind::MergeConflict);
        }

        Ok(report)
    }
}
