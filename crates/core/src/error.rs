use crate::types::{ContributionKind, DeclarationId, Priority, ScopeId, TypeId, UnitId};
use serde::Serialize;
use std::io;

/// Errors that can occur while recording, resolving or merging contributions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{declaration} is contributed to {scope} as {kind} more than once in unit {unit}")]
    DuplicateContribution {
        unit: UnitId,
        declaration: DeclarationId,
        scope: ScopeId,
        kind: ContributionKind,
    },

    #[error("Invalid contribution {declaration} to {scope}: {reason}")]
    InvalidContribution {
        declaration: DeclarationId,
        scope: ScopeId,
        reason: String,
    },

    #[error(
        "{contributor} with scope {scope} wants to replace {target}, but the replaced declaration \
         isn't contributed to the same scope (contributed to: {})",
        join_ids(.target_scopes)
    )]
    ReplacementScopeMismatch {
        contributor: DeclarationId,
        scope: ScopeId,
        target: DeclarationId,
        target_scopes: Vec<ScopeId>,
    },

    #[error(
        "{contributor} with scope {scope} wants to replace {target}, but the replaced declaration \
         is not {} (contributed as: {})",
        describe_bucket(.contributor_kind),
        join_ids(.target_kinds)
    )]
    ReplacementKindMismatch {
        contributor: DeclarationId,
        scope: ScopeId,
        target: DeclarationId,
        contributor_kind: ContributionKind,
        target_kinds: Vec<ContributionKind>,
    },

    #[error("Replacement cycle in scope {scope}: {}", join_cycle(.cycle))]
    ReplacementCycle {
        scope: ScopeId,
        cycle: Vec<DeclarationId>,
    },

    #[error(
        "There are multiple contributed bindings with the same bound type and priority in scope \
         {scope}. The bound type is {bound_type}{}. The priority is {priority}. \
         The contributed binding classes are: [{}]",
        describe_qualifier(.qualifier_key),
        join_ids(.contributors)
    )]
    AmbiguousBinding {
        scope: ScopeId,
        bound_type: TypeId,
        qualifier_key: Option<String>,
        priority: Priority,
        contributors: Vec<DeclarationId>,
    },

    #[error(
        "{merge_point} with scope {scope} wants to exclude {target}, but the excluded declaration \
         isn't contributed to the same scope"
    )]
    ExclusionScopeMismatch {
        merge_point: DeclarationId,
        scope: ScopeId,
        target: DeclarationId,
    },

    #[error(
        "{merge_point} with scope {scope} includes and excludes modules at the same time: [{}]",
        join_ids(.declarations)
    )]
    IncludeExcludeConflict {
        merge_point: DeclarationId,
        scope: ScopeId,
        declarations: Vec<DeclarationId>,
    },

    #[error(
        "{merge_point} with scope {scope} excludes types that it implements or extends. \
         These types cannot be excluded. Look at all the super types to find these classes: [{}]",
        join_ids(.declarations)
    )]
    ExcludedSupertype {
        merge_point: DeclarationId,
        scope: ScopeId,
        declarations: Vec<DeclarationId>,
    },

    #[error(
        "{declaration} is annotated with @{annotation} for {scope}, but this declaration is \
         neither an interface nor a module"
    )]
    UnsupportedContributionTarget {
        declaration: DeclarationId,
        scope: ScopeId,
        annotation: String,
    },

    #[error(
        "{declaration} is annotated with @{annotation} for {scope}, but the bound type cannot be \
         inferred from {supertypes} supertypes and must be specified explicitly"
    )]
    MissingBoundType {
        declaration: DeclarationId,
        scope: ScopeId,
        annotation: String,
        supertypes: usize,
    },

    #[error("{declaration} is registered as a merge point more than once in unit {unit}")]
    DuplicateMergePoint {
        unit: UnitId,
        declaration: DeclarationId,
    },

    #[error(
        "Metadata marker {key} from unit {unit} uses format version {found}, but version \
         {expected} is required"
    )]
    UnsupportedMetadataVersion {
        unit: UnitId,
        key: String,
        found: u32,
        expected: u32,
    },

    #[error("Malformed metadata marker {key}: {reason}")]
    MalformedMetadata { key: String, reason: String },

    #[error("Upstream metadata for unit {0} was already appended")]
    DuplicateUpstreamUnit(UnitId),

    #[error("Unit {unit} depends on unknown unit {dependency}")]
    UnknownUnit { unit: UnitId, dependency: UnitId },

    #[error("Unit dependency cycle: {}", join_cycle(.cycle))]
    UnitDependencyCycle { cycle: Vec<UnitId> },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for scopemerge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structured form of an [`Error`] for the host's diagnostic channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Declaration the diagnostic should be reported at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<DeclarationId>,
    /// Scope being merged when the error was detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeId>,
    /// Every declaration named by the error, location first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<DeclarationId>,
    pub message: String,
}

impl Error {
    /// Declaration at which the error should be reported
    pub fn location(&self) -> Option<&DeclarationId> {
        match self {
            Error::DuplicateContribution { declaration, .. }
            | Error::InvalidContribution { declaration, .. }
            | Error::UnsupportedContributionTarget { declaration, .. }
            | Error::MissingBoundType { declaration, .. }
            | Error::DuplicateMergePoint { declaration, .. } => Some(declaration),
            Error::ReplacementScopeMismatch { contributor, .. }
            | Error::ReplacementKindMismatch { contributor, .. } => Some(contributor),
            Error::ReplacementCycle { cycle, .. } => cycle.first(),
            Error::AmbiguousBinding { contributors, .. } => contributors.first(),
            Error::ExclusionScopeMismatch { merge_point, .. }
            | Error::IncludeExcludeConflict { merge_point, .. }
            | Error::ExcludedSupertype { merge_point, .. } => Some(merge_point),
            _ => None,
        }
    }

    /// Scope the error belongs to, if any
    pub fn scope(&self) -> Option<&ScopeId> {
        match self {
            Error::DuplicateContribution { scope, .. }
            | Error::InvalidContribution { scope, .. }
            | Error::ReplacementScopeMismatch { scope, .. }
            | Error::ReplacementKindMismatch { scope, .. }
            | Error::ReplacementCycle { scope, .. }
            | Error::AmbiguousBinding { scope, .. }
            | Error::ExclusionScopeMismatch { scope, .. }
            | Error::IncludeExcludeConflict { scope, .. }
            | Error::ExcludedSupertype { scope, .. }
            | Error::UnsupportedContributionTarget { scope, .. }
            | Error::MissingBoundType { scope, .. } => Some(scope),
            _ => None,
        }
    }

    /// Convert into the structured diagnostic reported to the host
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut related: Vec<DeclarationId> = self.location().into_iter().cloned().collect();
        let extra: &[DeclarationId] = match self {
            Error::ReplacementScopeMismatch { target, .. }
            | Error::ReplacementKindMismatch { target, .. }
            | Error::ExclusionScopeMismatch { target, .. } => std::slice::from_ref(target),
            Error::ReplacementCycle { cycle, .. } => cycle,
            Error::AmbiguousBinding { contributors, .. } => contributors,
            Error::IncludeExcludeConflict { declarations, .. }
            | Error::ExcludedSupertype { declarations, .. } => declarations,
            _ => &[],
        };
        for id in extra {
            if !related.contains(id) {
                related.push(id.clone());
            }
        }

        Diagnostic {
            location: self.location().cloned(),
            scope: self.scope().cloned(),
            related,
            message: self.to_string(),
        }
    }
}

fn join_ids<'a, T: std::fmt::Display + 'a>(ids: impl IntoIterator<Item = &'a T>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_bucket(replacing: &ContributionKind) -> &'static str {
    if replacing.is_module_bucket() {
        "a module"
    } else {
        "an interface"
    }
}

fn join_cycle<'a, T: std::fmt::Display + 'a>(cycle: impl IntoIterator<Item = &'a T>) -> String {
    cycle
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn describe_qualifier(qualifier: &Option<String>) -> String {
    match qualifier {
        Some(q) => format!(" (qualifier {q})"),
        None => String::new(),
    }
}
