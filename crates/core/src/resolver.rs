//! Scope resolution
//!
//! Gathers every contribution to a merge point's scope across the visible
//! closure and applies the merge point's exclusions. Exclusions are local to
//! the merge point: other merge points of the same scope still see the
//! excluded contributions.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{ContributionIndex, ContributionStore};
use crate::types::{Contribution, DeclarationId, MergePoint, ScopeId};
use tracing::debug;

/// Working set of one merge point, ready for conflict resolution
#[derive(Debug, Clone)]
pub struct ResolvedScope {
    pub merge_point: MergePoint,
    /// Contributions to the scope that survived exclusion, canonical order
    pub contributions: Vec<Contribution>,
    /// Contributions removed by the merge point's exclusions
    pub excluded: Vec<Contribution>,
    /// Indices over the whole closure
    pub index: ContributionIndex,
}

impl ResolvedScope {
    pub fn scope(&self) -> &ScopeId {
        &self.merge_point.scope
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

pub struct ScopeResolver<'a> {
    store: &'a ContributionStore,
    config: &'a Config,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(store: &'a ContributionStore, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Resolve the working set of `merge_point`
    pub fn resolve(&self, merge_point: &MergePoint) -> Result<ResolvedScope> {
        let index = self.store.closure_index()?;
        self.validate_exclusions(merge_point, &index)?;

        let (excluded, contributions): (Vec<_>, Vec<_>) = index
            .contributions_in(&merge_point.scope)
            .iter()
            .cloned()
            .partition(|c| merge_point.excludes.contains(&c.source_declaration_id));

        if contributions.is_empty() {
            debug!(
                "No contributions to scope {} for merge point {}",
                merge_point.scope, merge_point.declaration_id
            );
        } else {
            debug!(
                "Resolved {} contributions ({} excluded) to scope {} for {}",
                contributions.len(),
                excluded.len(),
                merge_point.scope,
                merge_point.declaration_id
            );
        }

        Ok(ResolvedScope {
            merge_point: merge_point.clone(),
            contributions,
            excluded,
            index,
        })
    }

    fn validate_exclusions(&self, merge_point: &MergePoint, index: &ContributionIndex) -> Result<()> {
        if self.config.check_include_exclude {
            let both = sorted_unique(
                merge_point
                    .includes
                    .iter()
                    .filter(|id| merge_point.excludes.contains(*id)),
            );
            if !both.is_empty() {
                return Err(Error::IncludeExcludeConflict {
                    merge_point: merge_point.declaration_id.clone(),
                    scope: merge_point.scope.clone(),
                    declarations: both,
                });
            }
        }

        let supertypes: Vec<_> = merge_point
            .excludes
            .intersection(&merge_point.declared_supertypes)
            .cloned()
            .collect();
        if !supertypes.is_empty() {
            return Err(Error::ExcludedSupertype {
                merge_point: merge_point.declaration_id.clone(),
                scope: merge_point.scope.clone(),
                declarations: supertypes,
            });
        }

        if self.config.strict_exclusions {
            if let Some(target) = merge_point
                .excludes
                .iter()
                .find(|id| !index.is_contributed_to(id, &merge_point.scope))
            {
                return Err(Error::ExclusionScopeMismatch {
                    merge_point: merge_point.declaration_id.clone(),
                    scope: merge_point.scope.clone(),
                    target: target.clone(),
                });
            }
        }

        Ok(())
    }
}

fn sorted_unique<'a>(ids: impl Iterator<Item = &'a DeclarationId>) -> Vec<DeclarationId> {
    let mut ids: Vec<_> = ids.cloned().collect();
    ids.sort();
    ids.dedup();
    ids
}
