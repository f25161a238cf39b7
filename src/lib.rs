//! Component canonicalization and indirect-reference resolution for the link stage.
pub mod core;
pub mod manifest;

pub use crate::core::events::{EventKind, LinkEvent};
pub use crate::core::graph::{Component, ComponentGraph, Edge, GraphError};
pub use crate::core::ledger::OutcomeLedger;
pub use crate::core::merge::{MergeRecord, MergeReport};
pub use crate::core::policy::LinkPolicy;
pub use crate::core::reduce::Rejection;
pub use crate::core::resolve::UnresolvedReference;
pub use crate::core::signature::{SemanticSignature, Signatures, StructuralSignature};
pub use crate::core::state::{Outcome, Outcomes, Phase};
pub use crate::core::types::{
    Activation, ActivationFn, Annotation, AnnotationSet, ComponentId, Context, ReferenceKind, Weight,
};
pub use crate::manifest::{Absorption, LinkManifest, Verdict};
