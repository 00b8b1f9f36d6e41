//! Replacement lists
//!
//! A contribution naming another declaration in `replaces` removes the
//! contributions of that declaration from the working set. Targets must be
//! contributed to the same scope in a compatible kind: modules and bindings
//! replace modules and bindings, interfaces replace interfaces. The `replaces`
//! graph restricted to the working set must be acyclic.

use crate::error::{Error, Result};
use crate::store::ContributionIndex;
use crate::types::{Contribution, ContributionKind, DeclarationId, ScopeId};
use std::collections::{BTreeMap, BTreeSet};

/// Check that every replacement target is contributed to `scope` in a kind
/// its replacer may replace
pub fn check_targets(
    scope: &ScopeId,
    working_set: &[Contribution],
    index: &ContributionIndex,
) -> Result<()> {
    for contribution in working_set {
        for target in &contribution.replaces {
            if !index.is_contributed_to(target, scope) {
                return Err(Error::ReplacementScopeMismatch {
                    contributor: contribution.source_declaration_id.clone(),
                    scope: scope.clone(),
                    target: target.clone(),
                    target_scopes: index.scopes_of(target),
                });
            }

            let target_kinds: BTreeSet<ContributionKind> = index
                .contributions_in(scope)
                .iter()
                .filter(|c| c.source_declaration_id == *target)
                .map(|c| c.kind)
                .collect();
            let bucket = contribution.kind.is_module_bucket();
            if !target_kinds.iter().any(|kind| kind.is_module_bucket() == bucket) {
                return Err(Error::ReplacementKindMismatch {
                    contributor: contribution.source_declaration_id.clone(),
                    scope: scope.clone(),
                    target: target.clone(),
                    contributor_kind: contribution.kind,
                    target_kinds: target_kinds.into_iter().collect(),
                });
            }
        }
    }
    Ok(())
}

/// Fail with the first cycle found in the working set's `replaces` graph
///
/// Declarations are visited in lexical order so the reported cycle is the
/// same on every run. The cycle starts and ends with the same declaration.
pub fn detect_cycle(scope: &ScopeId, working_set: &[Contribution]) -> Result<()> {
    let graph = replacement_graph(working_set);

    let mut finished = BTreeSet::new();
    for &start in graph.keys() {
        let mut path = Vec::new();
        if let Some(cycle) = visit(start, &graph, &mut path, &mut finished) {
            return Err(Error::ReplacementCycle {
                scope: scope.clone(),
                cycle,
            });
        }
    }
    Ok(())
}

/// Union of the `replaces` lists of the working set
pub fn replaced_declarations(working_set: &[Contribution]) -> BTreeSet<DeclarationId> {
    working_set
        .iter()
        .flat_map(|c| c.replaces.iter().cloned())
        .collect()
}

/// Whether a replacer in the working set removes `contribution`
///
/// A replacement only removes contributions in the replacer's own bucket, so
/// a module replacing a declaration leaves that declaration's interface alone.
pub fn is_replaced(contribution: &Contribution, working_set: &[Contribution]) -> bool {
    let bucket = contribution.kind.is_module_bucket();
    working_set.iter().any(|replacer| {
        replacer.kind.is_module_bucket() == bucket
            && replacer.replaces.contains(&contribution.source_declaration_id)
    })
}

fn replacement_graph(
    working_set: &[Contribution],
) -> BTreeMap<&DeclarationId, BTreeSet<&DeclarationId>> {
    let present: BTreeSet<&DeclarationId> = working_set
        .iter()
        .map(|c| &c.source_declaration_id)
        .collect();

    let mut graph: BTreeMap<&DeclarationId, BTreeSet<&DeclarationId>> = BTreeMap::new();
    for contribution in working_set {
        let edges = graph.entry(&contribution.source_declaration_id).or_default();
        edges.extend(contribution.replaces.iter().filter(|t| present.contains(t)));
    }
    graph
}

fn visit<'a>(
    node: &'a DeclarationId,
    graph: &BTreeMap<&'a DeclarationId, BTreeSet<&'a DeclarationId>>,
    path: &mut Vec<&'a DeclarationId>,
    finished: &mut BTreeSet<&'a DeclarationId>,
) -> Option<Vec<DeclarationId>> {
    if finished.contains(node) {
        return None;
    }
    if let Some(position) = path.iter().position(|on_path| *on_path == node) {
        let mut cycle: Vec<DeclarationId> =
            path[position..].iter().map(|id| (*id).clone()).collect();
        cycle.push(node.clone());
        return Some(cycle);
    }

    path.push(node);
    if let Some(targets) = graph.get(node) {
        for &target in targets {
            if let Some(cycle) = visit(target, graph, path, finished) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    finished.insert(node);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_node_cycle() {
        let working_set = vec![
            Contribution::module("a.A", "s.S").replacing("a.B"),
            Contribution::module("a.B", "s.S").replacing("a.A"),
        ];

        let err = detect_cycle(&"s.S".into(), &working_set).unwrap_err();
        match err {
            Error::ReplacementCycle { cycle, .. } => {
                let cycle: Vec<_> = cycle.iter().map(DeclarationId::as_str).collect();
                assert_eq!(cycle, vec!["a.A", "a.B", "a.A"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_longer_cycle_reported_in_full() {
        let working_set = vec![
            Contribution::module("a.Entry", "s.S").replacing("a.X"),
            Contribution::module("a.X", "s.S").replacing("a.Y"),
            Contribution::module("a.Y", "s.S").replacing("a.Z"),
            Contribution::module("a.Z", "s.S").replacing("a.X"),
        ];

        let err = detect_cycle(&"s.S".into(), &working_set).unwrap_err();
        match err {
            Error::ReplacementCycle { cycle, .. } => {
                let cycle: Vec<_> = cycle.iter().map(DeclarationId::as_str).collect();
                assert_eq!(cycle, vec!["a.X", "a.Y", "a.Z", "a.X"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_chain_is_not_a_cycle() {
        let working_set = vec![
            Contribution::module("a.A", "s.S").replacing("a.B"),
            Contribution::module("a.B", "s.S").replacing("a.C"),
            Contribution::module("a.C", "s.S"),
        ];
        assert!(detect_cycle(&"s.S".into(), &working_set).is_ok());
        assert_eq!(
            replaced_declarations(&working_set),
            BTreeSet::from([DeclarationId::from("a.B"), DeclarationId::from("a.C")])
        );
    }

    #[test]
    fn test_target_in_other_scope() {
        let closure = vec![
            Contribution::module("a.A", "s.One"),
            Contribution::module("b.B", "s.Two").replacing("a.A"),
        ];
        let index = ContributionIndex::build(&closure);
        let working_set = index.contributions_in(&"s.Two".into()).to_vec();

        let err = check_targets(&"s.Two".into(), &working_set, &index).unwrap_err();
        match err {
            Error::ReplacementScopeMismatch {
                contributor,
                target,
                target_scopes,
                ..
            } => {
                assert_eq!(contributor.as_str(), "b.B");
                assert_eq!(target.as_str(), "a.A");
                assert_eq!(target_scopes, vec![ScopeId::from("s.One")]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interface_cannot_replace_module() {
        let closure = vec![
            Contribution::module("app.NetworkModule", "app.AppScope"),
            Contribution::interface("app.Api", "app.AppScope").replacing("app.NetworkModule"),
        ];
        let index = ContributionIndex::build(&closure);
        let working_set = index.contributions_in(&"app.AppScope".into()).to_vec();

        let err = check_targets(&"app.AppScope".into(), &working_set, &index).unwrap_err();
        match err {
            Error::ReplacementKindMismatch {
                contributor,
                target,
                contributor_kind,
                target_kinds,
                ..
            } => {
                assert_eq!(contributor.as_str(), "app.Api");
                assert_eq!(target.as_str(), "app.NetworkModule");
                assert_eq!(contributor_kind, ContributionKind::BindingInterface);
                assert_eq!(target_kinds, vec![ContributionKind::Module]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_module_cannot_replace_interface() {
        let closure = vec![
            Contribution::interface("app.Api", "app.AppScope"),
            Contribution::module("app.FakeModule", "app.AppScope").replacing("app.Api"),
        ];
        let index = ContributionIndex::build(&closure);
        let working_set = index.contributions_in(&"app.AppScope".into()).to_vec();

        let err = check_targets(&"app.AppScope".into(), &working_set, &index).unwrap_err();
        assert!(err.to_string().contains("is not a module (contributed as: binding_interface)"));
    }

    #[test]
    fn test_binding_may_replace_module() {
        let closure = vec![
            Contribution::module("app.RealModule", "app.AppScope"),
            Contribution::binding("app.Fake", "app.AppScope", "app.Api").replacing("app.RealModule"),
        ];
        let index = ContributionIndex::build(&closure);
        let working_set = index.contributions_in(&"app.AppScope".into()).to_vec();

        assert!(check_targets(&"app.AppScope".into(), &working_set, &index).is_ok());
        let real = working_set
            .iter()
            .find(|c| c.source_declaration_id.as_str() == "app.RealModule")
            .unwrap();
        assert!(is_replaced(real, &working_set));
    }

    #[test]
    fn test_replacement_stays_in_its_bucket() {
        let working_set = vec![
            Contribution::interface("app.Shared", "app.AppScope"),
            Contribution::module("app.Shared", "app.AppScope"),
            Contribution::module("app.Fake", "app.AppScope").replacing("app.Shared"),
        ];

        assert!(!is_replaced(&working_set[0], &working_set));
        assert!(is_replaced(&working_set[1], &working_set));
        assert!(!is_replaced(&working_set[2], &working_set));
    }
}
