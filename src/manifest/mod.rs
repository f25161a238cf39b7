// run manifest for the naming and linking collaborators, persisted by the caller
pub mod finalize;

use serde::Serialize;

use crate::core::graph::GraphError;
use crate::core::ledger::OutcomeLedger;
use crate::core::merge::MergeRecord;
use crate::core::resolve::UnresolvedReference;
use crate::core::types::ComponentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Absorption {
    pub component: ComponentId,
    pub canonical: ComponentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkManifest {
    //promotion order
    pub canonical: Vec<ComponentId>,
    //discovery order
    pub absorbed: Vec<Absorption>,
    pub merges: Vec<MergeRecord>,
    pub unresolved: Vec<UnresolvedReference>,
    pub ledger: OutcomeLedger,
    pub verdict: Verdict,
}

impl LinkManifest {
    pub fn to_toon(&self) -> Result<String, GraphError> {
        let value = serde_json::to_value(self).map_err(|e| GraphError::Encoding(e.to_string()))?;
        toon_format::encode_default(&value).map_err(|e| GraphError::Encoding(e.to_string()))
    }
}
