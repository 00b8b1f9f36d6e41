//! Conflict and replacement resolution
//!
//! Turns a resolved working set into an order-stable set of contributions:
//! replacement lists are applied first, then binding conflicts are settled by
//! priority, then modules and interfaces are accumulated.

pub mod bindings;
pub mod replacement;

pub use bindings::BindingOutcome;

use crate::error::Result;
use crate::resolver::ResolvedScope;
use crate::types::{BindingKey, Contribution, ContributionKind, DeclarationId, ScopeId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Contributions that survive conflict resolution for one merge point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictResolution {
    pub scope: ScopeId,
    /// Surviving binding interfaces, lexical by declaration id
    pub interfaces: Vec<Contribution>,
    /// Surviving modules plus surviving bindings, lexical by declaration id then kind
    pub modules: Vec<Contribution>,
    /// Surviving bindings and multibindings per contract
    pub bindings: BTreeMap<BindingKey, Vec<Contribution>>,
    /// Declarations removed by replacement
    pub replaced: BTreeSet<DeclarationId>,
    /// Bindings that lost to a higher priority
    pub shadowed: Vec<Contribution>,
}

impl ConflictResolution {
    /// All surviving contributions, interfaces first then modules
    pub fn ordered(&self) -> Vec<&Contribution> {
        self.interfaces.iter().chain(self.modules.iter()).collect()
    }
}

#[derive(Debug, Default)]
pub struct ConflictEngine;

impl ConflictEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply replacements and binding priorities to a resolved working set
    pub fn resolve(&self, resolved: &ResolvedScope) -> Result<ConflictResolution> {
        let scope = resolved.scope();
        let working_set = &resolved.contributions;

        replacement::check_targets(scope, working_set, &resolved.index)?;
        replacement::detect_cycle(scope, working_set)?;

        let replaced = replacement::replaced_declarations(working_set);
        let surviving: Vec<Contribution> = working_set
            .iter()
            .filter(|c| !replacement::is_replaced(c, working_set))
            .cloned()
            .collect();
        if !replaced.is_empty() {
            debug!(
                "Replaced {} declarations in scope {} for {}",
                replaced.len(),
                scope,
                resolved.merge_point.declaration_id
            );
        }

        let outcome = bindings::resolve_bindings(scope, &surviving)?;

        let mut interfaces = Vec::new();
        let mut modules = Vec::new();
        for contribution in surviving {
            match contribution.kind {
                ContributionKind::BindingInterface => interfaces.push(contribution),
                ContributionKind::Module => modules.push(contribution),
                ContributionKind::Binding | ContributionKind::MultiBinding => {
                    if outcome.is_winner(&contribution) {
                        modules.push(contribution);
                    }
                }
            }
        }

        Ok(ConflictResolution {
            scope: scope.clone(),
            interfaces,
            modules,
            bindings: outcome.winners,
            replaced,
            shadowed: outcome.shadowed,
        })
    }
}
