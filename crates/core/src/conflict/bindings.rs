//! Binding conflicts
//!
//! Bindings are grouped by their contract (bound type plus qualifier).
//! Multibindings in a group accumulate. Among single bindings only the
//! highest priority survives, and a tie between distinct declarations at that
//! priority is ambiguous.

use crate::error::{Error, Result};
use crate::types::{BindingKey, Contribution, ContributionKind, DeclarationId, ScopeId};
use std::collections::{BTreeMap, BTreeSet};

/// Bindings left after priority resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingOutcome {
    /// Surviving bindings and multibindings per contract
    pub winners: BTreeMap<BindingKey, Vec<Contribution>>,
    /// Single bindings that lost to a higher priority
    pub shadowed: Vec<Contribution>,
}

impl BindingOutcome {
    pub fn is_winner(&self, contribution: &Contribution) -> bool {
        contribution
            .binding_key()
            .and_then(|key| self.winners.get(&key))
            .is_some_and(|winners| winners.contains(contribution))
    }
}

/// Resolve the binding contributions of a replacement-free working set
pub fn resolve_bindings(scope: &ScopeId, working_set: &[Contribution]) -> Result<BindingOutcome> {
    let mut groups: BTreeMap<BindingKey, Vec<&Contribution>> = BTreeMap::new();
    for contribution in working_set {
        if let Some(key) = contribution.binding_key() {
            groups.entry(key).or_default().push(contribution);
        }
    }

    let mut outcome = BindingOutcome::default();
    for (key, group) in groups {
        let (multi, single): (Vec<&Contribution>, Vec<&Contribution>) = group
            .into_iter()
            .partition(|c| c.kind == ContributionKind::MultiBinding);

        let mut winners: Vec<Contribution> = multi.into_iter().cloned().collect();

        if let Some(highest) = single.iter().map(|c| c.priority).max() {
            let top: BTreeSet<&DeclarationId> = single
                .iter()
                .filter(|c| c.priority == highest)
                .map(|c| &c.source_declaration_id)
                .collect();

            if top.len() > 1 {
                return Err(Error::AmbiguousBinding {
                    scope: scope.clone(),
                    bound_type: key.bound_type.clone(),
                    qualifier_key: key.qualifier_key.clone(),
                    priority: highest,
                    contributors: top.into_iter().cloned().collect(),
                });
            }

            for contribution in single {
                if contribution.priority == highest {
                    winners.push(contribution.clone());
                } else {
                    tracing::debug!(
                        "{} ({}) for {} is shadowed by a {} binding in scope {}",
                        contribution.source_declaration_id,
                        contribution.priority,
                        key,
                        highest,
                        scope
                    );
                    outcome.shadowed.push(contribution.clone());
                }
            }
        }

        winners.sort();
        outcome.winners.insert(key, winners);
    }

    outcome.shadowed.sort();
    Ok(outcome)
}
