//! The merged declaration handed to the emission sink

use super::contribution::{Contribution, ContributionKind};
use super::ids::{DeclarationId, ScopeId, TypeId};
use super::merge_point::MergeKind;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a final entry of a [`MergedResult`] came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// One or more contributions, one per contributed kind
    Contributed { contributions: Vec<Contribution> },
    /// Listed in the merge point's manual includes
    Included,
    /// Listed in the merge point's dependencies
    Dependency,
}

impl Provenance {
    pub fn is_contributed(&self) -> bool {
        matches!(self, Provenance::Contributed { .. })
    }

    /// Kinds of the originating contributions, empty for manual entries
    pub fn kinds(&self) -> Vec<ContributionKind> {
        match self {
            Provenance::Contributed { contributions } => {
                contributions.iter().map(|c| c.kind).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Final merged descriptor for one merge point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedResult {
    pub merge_point: DeclarationId,
    pub scope: ScopeId,
    pub kind: MergeKind,
    pub final_modules: Vec<DeclarationId>,
    pub final_supertypes: Vec<DeclarationId>,
    pub dependencies: Vec<TypeId>,
    /// Origin of every final module, supertype and dependency
    ///
    /// Keyed by name in one map: a dependency sharing its name with a module
    /// or supertype keeps that entry's provenance, and is still listed in
    /// `dependencies`.
    pub provenance: BTreeMap<DeclarationId, Provenance>,
}

impl MergedResult {
    /// Byte-stable JSON rendering
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn provenance_of(&self, entry: &DeclarationId) -> Option<&Provenance> {
        self.provenance.get(entry)
    }

    pub fn is_empty(&self) -> bool {
        self.final_modules.is_empty()
            && self.final_supertypes.is_empty()
            && self.dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_serializes_with_source_tag() {
        let included = serde_json::to_value(Provenance::Included).unwrap();
        assert_eq!(included, serde_json::json!({"source": "included"}));

        let contributed = Provenance::Contributed {
            contributions: vec![Contribution::module("a.M", "s.S")],
        };
        let value = serde_json::to_value(&contributed).unwrap();
        assert_eq!(value["source"], "contributed");
        assert_eq!(value["contributions"][0]["kind"], "module");
        assert_eq!(contributed.kinds(), vec![ContributionKind::Module]);
    }
}
