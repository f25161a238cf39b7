// component -> canonical form mapping
use crate::core::graph::{ComponentGraph, GraphError};
use crate::core::types::ComponentId;

impl ComponentGraph {
    //rules for the canonical mapping:
    //1. a component maps to at most one canonical form, set once
    //2. a canonical form maps to itself
    //3. many components may map to the same canonical form
    //4. remapping to the same target is a no-op, remapping elsewhere is an error

    pub(crate) fn set_canonical(&mut self, idx: usize, canonical_idx: usize) -> Result<(), GraphError> {
        match self.canonical.get(&idx).copied() {
            None => {
                self.canonical.insert(idx, canonical_idx);
                Ok(())
            }
            Some(old) if old == canonical_idx => Ok(()),
            Some(old) => Err(GraphError::CanonicalAlreadySet {
                component: self.components[idx].id,
                old: self.components[old].id,
                new: self.components[canonical_idx].id,
            }),
        }
    }

    //follow the mapping to its fixed point. the walk is bounded by the number of
    //components, so a cycle is reported instead of looping
    pub(crate) fn resolve_canonical(&self, idx: usize) -> Result<usize, GraphError> {
        let mut current = idx;
        for _ in 0..=self.components.len() {
            match self.canonical.get(&current).copied() {
                Some(next) if next == current => return Ok(current),
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        Err(GraphError::CanonicalCycle(self.components[idx].id))
    }

    pub fn canonical_of(&self, id: ComponentId) -> Result<ComponentId, GraphError> {
        let idx = self.idx_of(id)?;
        let canon = self.resolve_canonical(idx)?;
        Ok(self.components[canon].id)
    }

    pub fn is_canonical(&self, id: ComponentId) -> Result<bool, GraphError> {
        let idx = self.idx_of(id)?;
        Ok(self.canonical.get(&idx) == Some(&idx))
    }

    pub fn absorbed_by(&self, id: ComponentId) -> Result<Option<ComponentId>, GraphError> {
        let idx = self.idx_of(id)?;
        match self.canonical.get(&idx).copied() {
            Some(c) if c != idx => Ok(Some(self.components[self.resolve_canonical(c)?].id)),
            _ => Ok(None),
        }
    }

    pub fn canonical_ids(&self) -> Vec<ComponentId> {
        self.canonical_set
            .iter()
            .map(|&idx| self.components[idx].id)
            .collect()
    }

    pub fn iter_absorbed(&self) -> impl Iterator<Item = (ComponentId, ComponentId)> + '_ {
        self.components.iter().enumerate().filter_map(|(idx, c)| {
            let canon = self.resolve_canonical(idx).ok()?;
            (canon != idx).then(|| (c.id, self.components[canon].id))
        })
    }
}
