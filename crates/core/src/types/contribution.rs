//! Contributed declarations
//!
//! A [`Contribution`] is one annotated declaration participating in the merged
//! graph of one scope. Contributions are created once, serialized into the
//! unit's metadata and never mutated afterwards.

use super::ids::{DeclarationId, ScopeId, TypeId};
use crate::error::{Error, Result};
use crate::impl_case_insensitive_deserialize;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// What a contribution adds to the merged declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    /// A module providing bindings
    Module,
    /// An interface the merged declaration extends
    BindingInterface,
    /// A single-value binding of a contract type
    Binding,
    /// A binding that accumulates into a collection
    MultiBinding,
}

impl_case_insensitive_deserialize!(
    ContributionKind,
    Module => "module",
    BindingInterface => "binding_interface",
    Binding => "binding",
    MultiBinding => "multi_binding"
);

impl ContributionKind {
    /// Stable tag used in metadata keys
    pub fn tag(&self) -> &'static str {
        match self {
            ContributionKind::Module => "module",
            ContributionKind::BindingInterface => "binding_interface",
            ContributionKind::Binding => "binding",
            ContributionKind::MultiBinding => "multi_binding",
        }
    }

    /// Parse a tag produced by [`ContributionKind::tag`]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "module" => Some(ContributionKind::Module),
            "binding_interface" => Some(ContributionKind::BindingInterface),
            "binding" => Some(ContributionKind::Binding),
            "multi_binding" => Some(ContributionKind::MultiBinding),
            _ => None,
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, ContributionKind::Binding | ContributionKind::MultiBinding)
    }

    /// Modules, bindings and multibindings all end up as modules of the merged graph
    pub fn is_module_bucket(&self) -> bool {
        !matches!(self, ContributionKind::BindingInterface)
    }
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Tie-break ranking among competing single-value bindings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Highest,
}

impl_case_insensitive_deserialize!(
    Priority,
    Normal => "normal",
    High => "high",
    Highest => "highest"
);

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "NORMAL"),
            Priority::High => write!(f, "HIGH"),
            Priority::Highest => write!(f, "HIGHEST"),
        }
    }
}

/// The contract a binding provides: bound type plus optional qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BindingKey {
    pub bound_type: TypeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier_key: Option<String>,
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier_key {
            Some(qualifier) => write!(f, "@{} {}", qualifier, self.bound_type),
            None => write!(f, "{}", self.bound_type),
        }
    }
}

/// Identity of a recorded contribution within one compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributionKey {
    pub scope: ScopeId,
    pub declaration: DeclarationId,
    pub kind: ContributionKind,
}

/// One annotated declaration contributing to a scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contribution {
    /// Fully-qualified name of the annotated declaration
    pub source_declaration_id: DeclarationId,
    /// Scope the declaration contributes to
    pub scope: ScopeId,
    pub kind: ContributionKind,
    /// Declarations this contribution supersedes within the same scope
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub replaces: BTreeSet<DeclarationId>,
    /// Contract type for bindings and multibindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_type: Option<TypeId>,
    /// Disambiguates several bindings of the same contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier_key: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_multibinding: bool,
}

impl Contribution {
    /// Create a contribution of the given kind with default metadata
    pub fn new(
        source_declaration_id: impl Into<DeclarationId>,
        scope: impl Into<ScopeId>,
        kind: ContributionKind,
    ) -> Self {
        Self {
            source_declaration_id: source_declaration_id.into(),
            scope: scope.into(),
            kind,
            replaces: BTreeSet::new(),
            bound_type: None,
            qualifier_key: None,
            priority: Priority::Normal,
            is_multibinding: kind == ContributionKind::MultiBinding,
        }
    }

    /// A contributed module
    pub fn module(id: impl Into<DeclarationId>, scope: impl Into<ScopeId>) -> Self {
        Self::new(id, scope, ContributionKind::Module)
    }

    /// A contributed interface merged into the supertypes
    pub fn interface(id: impl Into<DeclarationId>, scope: impl Into<ScopeId>) -> Self {
        Self::new(id, scope, ContributionKind::BindingInterface)
    }

    /// A single-value binding of `bound_type`
    pub fn binding(
        id: impl Into<DeclarationId>,
        scope: impl Into<ScopeId>,
        bound_type: impl Into<TypeId>,
    ) -> Self {
        let mut contribution = Self::new(id, scope, ContributionKind::Binding);
        contribution.bound_type = Some(bound_type.into());
        contribution
    }

    /// A multibinding of `bound_type`
    pub fn multibinding(
        id: impl Into<DeclarationId>,
        scope: impl Into<ScopeId>,
        bound_type: impl Into<TypeId>,
    ) -> Self {
        let mut contribution = Self::new(id, scope, ContributionKind::MultiBinding);
        contribution.bound_type = Some(bound_type.into());
        contribution
    }

    /// Builder method adding a replaced declaration
    pub fn replacing(mut self, target: impl Into<DeclarationId>) -> Self {
        self.replaces.insert(target.into());
        self
    }

    /// Builder method for the qualifier key
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier_key = Some(qualifier.into());
        self
    }

    /// Builder method for the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Identity used for duplicate detection inside one unit
    pub fn key(&self) -> ContributionKey {
        ContributionKey {
            scope: self.scope.clone(),
            declaration: self.source_declaration_id.clone(),
            kind: self.kind,
        }
    }

    /// The contract this contribution binds, for binding kinds
    pub fn binding_key(&self) -> Option<BindingKey> {
        if !self.kind.is_binding() {
            return None;
        }
        self.bound_type.as_ref().map(|bound_type| BindingKey {
            bound_type: bound_type.clone(),
            qualifier_key: self.qualifier_key.clone(),
        })
    }

    /// Check the invariants that hold independently of other contributions
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidContribution {
            declaration: self.source_declaration_id.clone(),
            scope: self.scope.clone(),
            reason: reason.to_string(),
        };

        if self.source_declaration_id.as_str().is_empty() {
            return Err(invalid("the declaration id is empty"));
        }
        if self.scope.as_str().is_empty() {
            return Err(invalid("the scope is empty"));
        }
        if self.replaces.contains(&self.source_declaration_id) {
            return Err(invalid("a contribution cannot replace itself"));
        }
        if self.is_multibinding != (self.kind == ContributionKind::MultiBinding) {
            return Err(invalid("the multibinding flag does not match the contribution kind"));
        }
        if self.kind.is_binding() {
            if self.bound_type.is_none() {
                return Err(invalid("bindings require a bound type"));
            }
        } else if self.bound_type.is_some() || self.qualifier_key.is_some() {
            return Err(invalid(
                "only bindings and multibindings carry a bound type or qualifier",
            ));
        }

        Ok(())
    }
}

impl Ord for Contribution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| self.source_declaration_id.cmp(&other.source_declaration_id))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.bound_type.cmp(&other.bound_type))
            .then_with(|| self.qualifier_key.cmp(&other.qualifier_key))
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.is_multibinding.cmp(&other.is_multibinding))
            .then_with(|| self.replaces.cmp(&other.replaces))
    }
}

impl PartialOrd for Contribution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Normal < Priority::High);
        assert!(Priority::High < Priority::Highest);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_priority_deserialize_any_case() {
        let high: Priority = serde_json::from_str(r#""HIGH""#).unwrap();
        assert_eq!(high, Priority::High);
        let highest: Priority = serde_json::from_str(r#""Highest""#).unwrap();
        assert_eq!(highest, Priority::Highest);
    }

    #[test]
    fn test_contribution_ordering_is_scope_then_declaration() {
        let mut contributions = vec![
            Contribution::module("b.Module", "s.One"),
            Contribution::module("a.Module", "s.Two"),
            Contribution::interface("a.Module", "s.One"),
            Contribution::module("a.Module", "s.One"),
        ];
        contributions.sort();

        let keys: Vec<_> = contributions
            .iter()
            .map(|c| (c.scope.as_str(), c.source_declaration_id.as_str(), c.kind))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("s.One", "a.Module", ContributionKind::Module),
                ("s.One", "a.Module", ContributionKind::BindingInterface),
                ("s.One", "b.Module", ContributionKind::Module),
                ("s.Two", "a.Module", ContributionKind::Module),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_self_replacement() {
        let contribution = Contribution::module("a.A", "s.S").replacing("a.A");
        let err = contribution.validate().unwrap_err();
        assert!(err.to_string().contains("cannot replace itself"));
    }

    #[test]
    fn test_validate_binding_requires_bound_type() {
        let mut binding = Contribution::binding("a.Impl", "s.S", "a.Api");
        assert!(binding.validate().is_ok());

        binding.bound_type = None;
        assert!(binding.validate().is_err());

        let module = Contribution::module("a.M", "s.S").with_qualifier("named");
        assert!(module.validate().is_err());
    }

    #[test]
    fn test_multibinding_flag_follows_kind() {
        let multi = Contribution::multibinding("a.Listener", "s.S", "a.Listener");
        assert!(multi.is_multibinding);
        assert!(multi.validate().is_ok());

        let mut inconsistent = Contribution::binding("a.Impl", "s.S", "a.Api");
        inconsistent.is_multibinding = true;
        assert!(inconsistent.validate().is_err());
    }

    #[test]
    fn test_binding_key() {
        let binding = Contribution::binding("a.Impl", "s.S", "a.Api").with_qualifier("prod");
        assert_eq!(
            binding.binding_key(),
            Some(BindingKey {
                bound_type: "a.Api".into(),
                qualifier_key: Some("prod".into()),
            })
        );
        assert_eq!(Contribution::module("a.M", "s.S").binding_key(), None);
    }
}
