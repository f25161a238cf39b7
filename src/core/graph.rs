// component store: arena of components addressed by index
use std::collections::{HashMap, HashSet};
use std::collections::TryReserveError;

use thiserror::Error;

use crate::core::events::EventLog;
use crate::core::merge::MergeRecord;
use crate::core::policy::LinkPolicy;
use crate::core::resolve::UnresolvedReference;
use crate::core::state::{Outcomes, Phase};
use crate::core::types::{Annotation, AnnotationSet, ComponentId, ReferenceKind, Weight};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),

    #[error("component {0} is already registered")]
    DuplicateComponent(ComponentId),

    #[error("component {0} was absorbed into a canonical form and is inert")]
    ComponentArchived(ComponentId),

    #[error("weight {value} is outside [0, 1]")]
    WeightOutOfRange { value: f64 },

    #[error("component {component} already reduced to {old}, refusing to remap to {new}")]
    CanonicalAlreadySet {
        component: ComponentId,
        old: ComponentId,
        new: ComponentId,
    },

    #[error("canonical references from component {0} do not reach a fixed point")]
    CanonicalCycle(ComponentId),

    #[error("annotation merge aborted, staging allocation failed: {0}")]
    MergeAllocation(#[from] TryReserveError),

    #[error("reduction cancelled after {processed} components")]
    Cancelled { processed: usize },

    #[error("invalid link policy: {0}")]
    InvalidPolicy(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("run recorded {count} false positive(s)")]
    FalsePositives { count: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: ComponentId,
    pub target: ComponentId,
    pub kind: ReferenceKind,
    pub weight: Weight,
}

#[derive(Debug, Clone)]
pub struct Component {
    pub id: ComponentId,
    pub phase: Phase,
    pub edges: Vec<Edge>,
    pub annotations: AnnotationSet,
    pub outcomes: Outcomes,
}

impl Component {
    pub fn new(id: ComponentId) -> Self {
        Component {
            id,
            phase: Phase::Dormant,
            edges: Vec::new(),
            annotations: AnnotationSet::new(),
            outcomes: Outcomes::default(),
        }
    }

    pub fn with_edge(mut self, target: ComponentId, kind: ReferenceKind, weight: Weight) -> Self {
        self.edges.push(Edge {
            source: self.id,
            target,
            kind,
            weight,
        });
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.insert(annotation);
        self
    }
}

/// Owns every discovered component for the duration of a run. Components are
/// never removed; absorbed ones stay archived in the arena.
#[derive(Debug, Default)]
pub struct ComponentGraph {
    pub(crate) components: Vec<Component>,
    pub(crate) index: HashMap<ComponentId, usize>,
    //component idx -> canonical idx, canonical forms map to themselves
    pub(crate) canonical: HashMap<usize, usize>,
    //canonical idxs in promotion order
    pub(crate) canonical_set: Vec<usize>,
    pub(crate) policy: LinkPolicy,
    pub(crate) events: EventLog,
    pub(crate) merges: Vec<MergeRecord>,
    pub(crate) unresolved: Vec<UnresolvedReference>,
    //canonical idx -> edge count at promotion, edges past it came from resolve
    pub(crate) reduced_edges: HashMap<usize, usize>,
    //(canonical, other) pairs already charged by the finalize audit
    pub(crate) audited: HashSet<(usize, usize)>,
    #[cfg(test)]
    pub(crate) fail_merges: bool,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: LinkPolicy) -> Result<Self, GraphError> {
        policy.validate()?;
        Ok(ComponentGraph {
            policy,
            ..Self::default()
        })
    }

    pub fn policy(&self) -> &LinkPolicy {
        &self.policy
    }

    pub fn add_component(&mut self, mut component: Component) -> Result<ComponentId, GraphError> {
        let id = component.id;
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateComponent(id));
        }

        component.phase = Phase::Dormant;
        let idx = self.components.len();
        self.components.push(component);
        self.index.insert(id, idx);

        tracing::trace!(component = id, idx, "component registered");
        Ok(id)
    }

    //stops at the first duplicate
    pub fn add_components(
        &mut self,
        batch: impl IntoIterator<Item = Component>,
    ) -> Result<Vec<ComponentId>, GraphError> {
        batch.into_iter().map(|c| self.add_component(c)).collect()
    }

    pub fn component(&self, id: ComponentId) -> Result<&Component, GraphError> {
        let idx = self.idx_of(id)?;
        Ok(&self.components[idx])
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.iter()
    }

    pub(crate) fn idx_of(&self, id: ComponentId) -> Result<usize, GraphError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::ComponentNotFound(id))
    }
}
