use scopemerge_core::{ChangeSet, DeclarationId, MergedResult, Provenance};
use std::fmt::Write;

/// Human-readable rendering of one merged declaration
pub fn format_result(result: &MergedResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}, scope {})",
        result.merge_point, result.kind, result.scope
    );

    write_section(&mut out, "modules", &result.final_modules, result);
    write_section(&mut out, "supertypes", &result.final_supertypes, result);

    if !result.dependencies.is_empty() {
        let _ = writeln!(out, "  dependencies:");
        for dependency in &result.dependencies {
            let _ = writeln!(out, "    {}", dependency);
        }
    }
    out
}

fn write_section(out: &mut String, title: &str, entries: &[DeclarationId], result: &MergedResult) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}:", title);
    for entry in entries {
        let _ = writeln!(out, "    {} [{}]", entry, describe(result.provenance_of(entry)));
    }
}

fn describe(provenance: Option<&Provenance>) -> String {
    match provenance {
        Some(Provenance::Contributed { contributions }) => contributions
            .iter()
            .map(|c| c.kind.tag())
            .collect::<Vec<_>>()
            .join(", "),
        Some(Provenance::Included) => "included".to_string(),
        Some(Provenance::Dependency) => "dependency".to_string(),
        None => "unknown".to_string(),
    }
}

/// Human-readable rendering of a change set
pub fn format_change_set(changes: &ChangeSet) -> String {
    if changes.is_empty() {
        return "No changes\n".to_string();
    }

    let mut out = String::new();
    for key in &changes.added {
        let _ = writeln!(out, "+ {}", key);
    }
    for key in &changes.removed {
        let _ = writeln!(out, "- {}", key);
    }
    for key in &changes.changed {
        let _ = writeln!(out, "~ {}", key);
    }
    let scopes: Vec<_> = changes.affected_scopes.iter().map(|s| s.as_str()).collect();
    let _ = writeln!(out, "affected scopes: {}", scopes.join(", "));
    out
}
