//! Plain-data events delivered by the host compiler

use crate::impl_case_insensitive_deserialize;
use crate::types::{DeclarationId, MergeKind, MergePoint, Priority, ScopeId, TypeId};
use serde::{Deserialize, Serialize};

/// Shape of an annotated declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationShape {
    Interface,
    Module,
    #[default]
    Class,
    Object,
}

impl_case_insensitive_deserialize!(
    DeclarationShape,
    Interface => "interface",
    Module => "module",
    Class => "class",
    Object => "object"
);

/// Arguments of one contribution annotation on a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationArguments {
    /// Capability tag, e.g. `ContributesTo`
    pub annotation: String,
    pub scope: ScopeId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaces: Vec<DeclarationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_type: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Drop the declaration's qualifier from the contributed binding
    #[serde(default)]
    pub ignore_qualifier: bool,
}

impl AnnotationArguments {
    pub fn new(annotation: impl Into<String>, scope: impl Into<ScopeId>) -> Self {
        Self {
            annotation: annotation.into(),
            scope: scope.into(),
            replaces: Vec::new(),
            bound_type: None,
            qualifier: None,
            priority: None,
            ignore_qualifier: false,
        }
    }

    pub fn replacing(mut self, target: impl Into<DeclarationId>) -> Self {
        self.replaces.push(target.into());
        self
    }

    pub fn with_bound_type(mut self, bound_type: impl Into<TypeId>) -> Self {
        self.bound_type = Some(bound_type.into());
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn ignoring_qualifier(mut self) -> Self {
        self.ignore_qualifier = true;
        self
    }
}

/// A declaration seen by the host, with its contribution annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationEvent {
    pub declaration: DeclarationId,
    #[serde(default)]
    pub shape: DeclarationShape,
    /// Directly declared supertypes, used to infer bound types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<TypeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationArguments>,
}

impl DeclarationEvent {
    pub fn new(declaration: impl Into<DeclarationId>, shape: DeclarationShape) -> Self {
        Self {
            declaration: declaration.into(),
            shape,
            supertypes: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_supertype(mut self, supertype: impl Into<TypeId>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn annotated(mut self, arguments: AnnotationArguments) -> Self {
        self.annotations.push(arguments);
        self
    }
}

/// A merge-point declaration seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePointEvent {
    pub declaration: DeclarationId,
    pub scope: ScopeId,
    #[serde(default)]
    pub kind: MergeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<DeclarationId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<DeclarationId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TypeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<DeclarationId>,
}

impl MergePointEvent {
    pub fn into_merge_point(self) -> MergePoint {
        MergePoint {
            declaration_id: self.declaration,
            scope: self.scope,
            kind: self.kind,
            excludes: self.excludes.into_iter().collect(),
            includes: self.includes,
            dependencies: self.dependencies,
            declared_supertypes: self.supertypes.into_iter().collect(),
        }
    }
}

impl From<MergePoint> for MergePointEvent {
    fn from(merge_point: MergePoint) -> Self {
        Self {
            declaration: merge_point.declaration_id,
            scope: merge_point.scope,
            kind: merge_point.kind,
            excludes: merge_point.excludes.into_iter().collect(),
            includes: merge_point.includes,
            dependencies: merge_point.dependencies,
            supertypes: merge_point.declared_supertypes.into_iter().collect(),
        }
    }
}
