// structural + semantic signatures, pure functions of component state
use serde::Serialize;

use crate::core::graph::{Component, ComponentGraph, Edge, GraphError};
use crate::core::types::{ComponentId, ReferenceKind, Weight};

//edge count plus sorted (kind, weight bucket), blind to order and targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StructuralSignature {
    pub edge_count: usize,
    pub shape: Vec<(ReferenceKind, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SemanticSignature(pub Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Signatures {
    pub structural: StructuralSignature,
    pub semantic: SemanticSignature,
}

impl Signatures {
    pub fn of(component: &Component, buckets: u32) -> Self {
        Signatures {
            structural: structural_signature(component, buckets),
            semantic: semantic_signature(component),
        }
    }

    pub fn equivalent(&self, other: &Signatures) -> bool {
        self == other
    }
}

fn weight_bucket(weight: Weight, buckets: u32) -> u32 {
    let buckets = buckets.max(1);
    //1.0 lands in the top bucket instead of its own
    ((weight.get() * buckets as f64).floor() as u32).min(buckets - 1)
}

pub fn structural_signature(component: &Component, buckets: u32) -> StructuralSignature {
    edge_signature(&component.edges, buckets)
}

pub(crate) fn edge_signature(edges: &[Edge], buckets: u32) -> StructuralSignature {
    let mut shape: Vec<(ReferenceKind, u32)> = edges
        .iter()
        .map(|e| (e.kind, weight_bucket(e.weight, buckets)))
        .collect();
    shape.sort_unstable();

    StructuralSignature {
        edge_count: edges.len(),
        shape,
    }
}

pub fn semantic_signature(component: &Component) -> SemanticSignature {
    //AnnotationSet iterates in key order already
    SemanticSignature(component.annotations.keys().map(str::to_owned).collect())
}

impl ComponentGraph {
    pub fn signatures_of(&self, id: ComponentId) -> Result<Signatures, GraphError> {
        let c = self.component(id)?;
        Ok(Signatures::of(c, self.policy.weight_buckets))
    }
}
