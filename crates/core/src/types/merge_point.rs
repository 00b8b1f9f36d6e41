//! Merge points: the aggregation roots that request a scope

use super::ids::{DeclarationId, ScopeId, TypeId};
use crate::impl_case_insensitive_deserialize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which contribution buckets a merge point pulls in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeKind {
    /// Root graph: modules and interfaces
    #[default]
    Component,
    /// Child graph: modules and interfaces
    Subcomponent,
    /// A module aggregating other modules
    Modules,
    /// An interface aggregating other interfaces
    Interfaces,
}

impl_case_insensitive_deserialize!(
    MergeKind,
    Component => "component",
    Subcomponent => "subcomponent",
    Modules => "modules",
    Interfaces => "interfaces"
);

impl MergeKind {
    pub fn merges_modules(&self) -> bool {
        !matches!(self, MergeKind::Interfaces)
    }

    pub fn merges_interfaces(&self) -> bool {
        !matches!(self, MergeKind::Modules)
    }
}

impl fmt::Display for MergeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeKind::Component => write!(f, "component"),
            MergeKind::Subcomponent => write!(f, "subcomponent"),
            MergeKind::Modules => write!(f, "modules"),
            MergeKind::Interfaces => write!(f, "interfaces"),
        }
    }
}

/// A declaration that requests the merged graph of one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePoint {
    pub declaration_id: DeclarationId,
    pub scope: ScopeId,
    #[serde(default)]
    pub kind: MergeKind,
    /// Contributions dropped for this merge point only
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excludes: BTreeSet<DeclarationId>,
    /// Modules listed by hand, in declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<DeclarationId>,
    /// Component dependencies, passed through untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TypeId>,
    /// Supertypes the merge point already declares itself
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub declared_supertypes: BTreeSet<DeclarationId>,
}

impl MergePoint {
    pub fn new(declaration_id: impl Into<DeclarationId>, scope: impl Into<ScopeId>) -> Self {
        Self {
            declaration_id: declaration_id.into(),
            scope: scope.into(),
            kind: MergeKind::default(),
            excludes: BTreeSet::new(),
            includes: Vec::new(),
            dependencies: Vec::new(),
            declared_supertypes: BTreeSet::new(),
        }
    }

    /// Builder method for the merge kind
    pub fn with_kind(mut self, kind: MergeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder method adding an excluded declaration
    pub fn excluding(mut self, declaration: impl Into<DeclarationId>) -> Self {
        self.excludes.insert(declaration.into());
        self
    }

    /// Builder method appending a manually included module
    pub fn including(mut self, module: impl Into<DeclarationId>) -> Self {
        self.includes.push(module.into());
        self
    }

    /// Builder method appending a dependency
    pub fn with_dependency(mut self, dependency: impl Into<TypeId>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Builder method adding a supertype the merge point declares
    pub fn with_supertype(mut self, supertype: impl Into<DeclarationId>) -> Self {
        self.declared_supertypes.insert(supertype.into());
        self
    }
}
