//! Aggregation synthesis
//!
//! Builds the merged descriptor of a merge point from its conflict
//! resolution.

use crate::conflict::ConflictResolution;
use crate::types::{Contribution, DeclarationId, MergePoint, MergedResult, Provenance};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct AggregationSynthesizer;

impl AggregationSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Merge the surviving contributions with the merge point's manual entries
    pub fn synthesize(
        &self,
        merge_point: &MergePoint,
        resolution: &ConflictResolution,
    ) -> MergedResult {
        let mut provenance: BTreeMap<DeclarationId, Provenance> = BTreeMap::new();

        let mut final_supertypes = Vec::new();
        if merge_point.kind.merges_interfaces() {
            for contribution in &resolution.interfaces {
                if merge_point
                    .declared_supertypes
                    .contains(&contribution.source_declaration_id)
                {
                    continue;
                }
                accumulate(&mut final_supertypes, &mut provenance, contribution);
            }
        }

        let mut final_modules = Vec::new();
        if merge_point.kind.merges_modules() {
            for contribution in &resolution.modules {
                accumulate(&mut final_modules, &mut provenance, contribution);
            }

            for include in &merge_point.includes {
                if final_modules.contains(include) {
                    continue;
                }
                final_modules.push(include.clone());
                provenance
                    .entry(include.clone())
                    .or_insert(Provenance::Included);
            }
        }

        let mut dependencies = Vec::new();
        for dependency in &merge_point.dependencies {
            if dependencies.contains(dependency) {
                continue;
            }
            dependencies.push(dependency.clone());
            provenance
                .entry(DeclarationId::new(dependency.as_str()))
                .or_insert(Provenance::Dependency);
        }

        tracing::debug!(
            "Synthesized {} with {} modules, {} supertypes and {} dependencies",
            merge_point.declaration_id,
            final_modules.len(),
            final_supertypes.len(),
            dependencies.len()
        );

        MergedResult {
            merge_point: merge_point.declaration_id.clone(),
            scope: merge_point.scope.clone(),
            kind: merge_point.kind,
            final_modules,
            final_supertypes,
            dependencies,
            provenance,
        }
    }
}

/// Add a contributed entry once, recording every contribution behind it
fn accumulate(
    entries: &mut Vec<DeclarationId>,
    provenance: &mut BTreeMap<DeclarationId, Provenance>,
    contribution: &Contribution,
) {
    let id = &contribution.source_declaration_id;
    if !entries.contains(id) {
        entries.push(id.clone());
    }

    match provenance.get_mut(id) {
        Some(Provenance::Contributed { contributions }) => {
            if !contributions.contains(contribution) {
                contributions.push(contribution.clone());
            }
        }
        Some(_) => {}
        None => {
            provenance.insert(
                id.clone(),
                Provenance::Contributed {
                    contributions: vec![contribution.clone()],
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContributionKind, MergeKind, ScopeId};
    use std::collections::BTreeSet;

    fn resolution(interfaces: Vec<Contribution>, modules: Vec<Contribution>) -> ConflictResolution {
        ConflictResolution {
            scope: ScopeId::from("app.AppScope"),
            interfaces,
            modules,
            bindings: BTreeMap::new(),
            replaced: BTreeSet::new(),
            shadowed: Vec::new(),
        }
    }

    #[test]
    fn test_includes_follow_contributed_modules() {
        let merge_point = MergePoint::new("app.AppComponent", "app.AppScope")
            .including("manual.ZModule")
            .including("app.NetworkModule")
            .including("manual.AModule");
        let resolution = resolution(
            Vec::new(),
            vec![Contribution::module("app.NetworkModule", "app.AppScope")],
        );

        let result = AggregationSynthesizer::new().synthesize(&merge_point, &resolution);
        let modules: Vec<_> = result.final_modules.iter().map(DeclarationId::as_str).collect();
        assert_eq!(modules, vec!["app.NetworkModule", "manual.ZModule", "manual.AModule"]);
        assert!(result.provenance[&DeclarationId::from("app.NetworkModule")].is_contributed());
        assert_eq!(result.provenance[&DeclarationId::from("manual.ZModule")], Provenance::Included);
    }

    #[test]
    fn test_declared_supertypes_are_not_repeated() {
        let merge_point =
            MergePoint::new("app.AppComponent", "app.AppScope").with_supertype("app.Declared");
        let resolution = resolution(
            vec![
                Contribution::interface("app.Declared", "app.AppScope"),
                Contribution::interface("app.Other", "app.AppScope"),
            ],
            Vec::new(),
        );

        let result = AggregationSynthesizer::new().synthesize(&merge_point, &resolution);
        assert_eq!(result.final_supertypes, vec![DeclarationId::from("app.Other")]);
    }

    #[test]
    fn test_merge_kind_selects_buckets() {
        let resolution = resolution(
            vec![Contribution::interface("app.Api", "app.AppScope")],
            vec![Contribution::module("app.Module", "app.AppScope")],
        );

        let modules_only = MergePoint::new("app.Aggregate", "app.AppScope").with_kind(MergeKind::Modules);
        let result = AggregationSynthesizer::new().synthesize(&modules_only, &resolution);
        assert_eq!(result.final_modules.len(), 1);
        assert!(result.final_supertypes.is_empty());

        let interfaces_only =
            MergePoint::new("app.Aggregate", "app.AppScope").with_kind(MergeKind::Interfaces);
        let result = AggregationSynthesizer::new().synthesize(&interfaces_only, &resolution);
        assert!(result.final_modules.is_empty());
        assert_eq!(result.final_supertypes.len(), 1);
    }

    #[test]
    fn test_one_entry_for_several_kinds() {
        let resolution = resolution(
            Vec::new(),
            vec![
                Contribution::module("app.Impl", "app.AppScope"),
                Contribution::binding("app.Impl", "app.AppScope", "app.Api"),
            ],
        );

        let result = AggregationSynthesizer::new()
            .synthesize(&MergePoint::new("app.AppComponent", "app.AppScope"), &resolution);
        assert_eq!(result.final_modules, vec![DeclarationId::from("app.Impl")]);
        assert_eq!(
            result.provenance[&DeclarationId::from("app.Impl")].kinds(),
            vec![ContributionKind::Module, ContributionKind::Binding]
        );
    }

    #[test]
    fn test_dependencies_pass_through_deduplicated() {
        let merge_point = MergePoint::new("app.AppComponent", "app.AppScope")
            .with_dependency("lib.Parent")
            .with_dependency("lib.Other")
            .with_dependency("lib.Parent");

        let result = AggregationSynthesizer::new()
            .synthesize(&merge_point, &resolution(Vec::new(), Vec::new()));
        let dependencies: Vec<_> = result.dependencies.iter().map(|d| d.as_str()).collect();
        assert_eq!(dependencies, vec!["lib.Parent", "lib.Other"]);
        assert_eq!(result.provenance[&DeclarationId::from("lib.Parent")], Provenance::Dependency);
    }

    #[test]
    fn test_dependency_named_like_a_module_keeps_module_provenance() {
        let merge_point = MergePoint::new("app.AppComponent", "app.AppScope")
            .with_dependency("app.SharedModule");
        let resolution = resolution(
            Vec::new(),
            vec![Contribution::module("app.SharedModule", "app.AppScope")],
        );

        let result = AggregationSynthesizer::new().synthesize(&merge_point, &resolution);
        assert_eq!(result.final_modules, vec![DeclarationId::from("app.SharedModule")]);
        assert_eq!(result.dependencies.len(), 1);
        assert!(result
            .provenance_of(&DeclarationId::from("app.SharedModule"))
            .is_some_and(Provenance::is_contributed));
    }
}
