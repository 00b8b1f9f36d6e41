//! Multi-valued indices over the visible contribution closure
//!
//! Always rebuilt from the complete closure. Nothing patches an index in place.

use crate::types::{Contribution, DeclarationId, ScopeId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionIndex {
    by_scope: BTreeMap<ScopeId, Vec<Contribution>>,
    scopes_by_declaration: BTreeMap<DeclarationId, BTreeSet<ScopeId>>,
}

impl ContributionIndex {
    /// Build both indices from a closure; exact duplicates collapse
    pub fn build<'a>(contributions: impl IntoIterator<Item = &'a Contribution>) -> Self {
        let unique: BTreeSet<&Contribution> = contributions.into_iter().collect();

        let mut index = Self::default();
        for contribution in unique {
            index
                .by_scope
                .entry(contribution.scope.clone())
                .or_default()
                .push(contribution.clone());
            index
                .scopes_by_declaration
                .entry(contribution.source_declaration_id.clone())
                .or_default()
                .insert(contribution.scope.clone());
        }
        index
    }

    /// Contributions to `scope`, in canonical order
    pub fn contributions_in(&self, scope: &ScopeId) -> &[Contribution] {
        self.by_scope.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every scope the declaration is contributed to, lexically ordered
    pub fn scopes_of(&self, declaration: &DeclarationId) -> Vec<ScopeId> {
        self.scopes_by_declaration
            .get(declaration)
            .map(|scopes| scopes.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_contributed_to(&self, declaration: &DeclarationId, scope: &ScopeId) -> bool {
        self.scopes_by_declaration
            .get(declaration)
            .is_some_and(|scopes| scopes.contains(scope))
    }

    pub fn scopes(&self) -> impl Iterator<Item = &ScopeId> {
        self.by_scope.keys()
    }

    /// Number of distinct contributions indexed
    pub fn len(&self) -> usize {
        self.by_scope.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_scope.is_empty()
    }
}
