//! Default contribution handlers

use super::events::{AnnotationArguments, DeclarationEvent, DeclarationShape};
use crate::error::{Error, Result};
use crate::types::{Contribution, TypeId};

pub const CONTRIBUTES_TO: &str = "ContributesTo";
pub const CONTRIBUTES_BINDING: &str = "ContributesBinding";
pub const CONTRIBUTES_MULTIBINDING: &str = "ContributesMultibinding";

/// Turns one annotation on a declaration into contributions
pub trait ContributionHandler: Send + Sync {
    /// Get the name of this handler
    fn name(&self) -> &str;

    /// Capability tag this handler is registered under
    fn annotation(&self) -> &str;

    /// Contributions produced by `arguments` on `declaration`
    fn contributions(
        &self,
        declaration: &DeclarationEvent,
        arguments: &AnnotationArguments,
    ) -> Result<Vec<Contribution>>;
}

/// `ContributesTo`: interfaces and modules
#[derive(Debug, Default)]
pub struct ContributesToHandler;

impl ContributesToHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ContributionHandler for ContributesToHandler {
    fn name(&self) -> &str {
        "contributes-to"
    }

    fn annotation(&self) -> &str {
        CONTRIBUTES_TO
    }

    fn contributions(
        &self,
        declaration: &DeclarationEvent,
        arguments: &AnnotationArguments,
    ) -> Result<Vec<Contribution>> {
        let id = declaration.declaration.clone();
        let scope = arguments.scope.clone();
        let contribution = match declaration.shape {
            DeclarationShape::Interface => Contribution::interface(id, scope),
            DeclarationShape::Module => Contribution::module(id, scope),
            DeclarationShape::Class | DeclarationShape::Object => {
                return Err(Error::UnsupportedContributionTarget {
                    declaration: id,
                    scope,
                    annotation: CONTRIBUTES_TO.to_string(),
                });
            }
        };

        Ok(vec![with_replacements(contribution, arguments)])
    }
}

/// `ContributesBinding`: a single-value binding of the bound type
#[derive(Debug, Default)]
pub struct ContributesBindingHandler;

impl ContributesBindingHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ContributionHandler for ContributesBindingHandler {
    fn name(&self) -> &str {
        "contributes-binding"
    }

    fn annotation(&self) -> &str {
        CONTRIBUTES_BINDING
    }

    fn contributions(
        &self,
        declaration: &DeclarationEvent,
        arguments: &AnnotationArguments,
    ) -> Result<Vec<Contribution>> {
        let bound_type = bound_type(declaration, arguments, CONTRIBUTES_BINDING)?;
        let mut contribution = Contribution::binding(
            declaration.declaration.clone(),
            arguments.scope.clone(),
            bound_type,
        )
        .with_priority(arguments.priority.unwrap_or_default());
        contribution.qualifier_key = qualifier(arguments);

        Ok(vec![with_replacements(contribution, arguments)])
    }
}

/// `ContributesMultibinding`: an element of the bound type's collection
#[derive(Debug, Default)]
pub struct ContributesMultibindingHandler;

impl ContributesMultibindingHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ContributionHandler for ContributesMultibindingHandler {
    fn name(&self) -> &str {
        "contributes-multibinding"
    }

    fn annotation(&self) -> &str {
        CONTRIBUTES_MULTIBINDING
    }

    fn contributions(
        &self,
        declaration: &DeclarationEvent,
        arguments: &AnnotationArguments,
    ) -> Result<Vec<Contribution>> {
        let bound_type = bound_type(declaration, arguments, CONTRIBUTES_MULTIBINDING)?;
        let mut contribution = Contribution::multibinding(
            declaration.declaration.clone(),
            arguments.scope.clone(),
            bound_type,
        );
        contribution.qualifier_key = qualifier(arguments);

        Ok(vec![with_replacements(contribution, arguments)])
    }
}

/// Explicit bound type, else the single declared supertype
fn bound_type(
    declaration: &DeclarationEvent,
    arguments: &AnnotationArguments,
    annotation: &str,
) -> Result<TypeId> {
    if let Some(bound_type) = &arguments.bound_type {
        return Ok(bound_type.clone());
    }

    match declaration.supertypes.as_slice() {
        [single] => Ok(single.clone()),
        supertypes => Err(Error::MissingBoundType {
            declaration: declaration.declaration.clone(),
            scope: arguments.scope.clone(),
            annotation: annotation.to_string(),
            supertypes: supertypes.len(),
        }),
    }
}

fn qualifier(arguments: &AnnotationArguments) -> Option<String> {
    if arguments.ignore_qualifier {
        None
    } else {
        arguments.qualifier.clone()
    }
}

fn with_replacements(mut contribution: Contribution, arguments: &AnnotationArguments) -> Contribution {
    contribution.replaces.extend(arguments.replaces.iter().cloned());
    contribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContributionKind, DeclarationId, Priority};

    #[test]
    fn test_contributes_to_interface_and_module() {
        let handler = ContributesToHandler::new();
        let args = AnnotationArguments::new(CONTRIBUTES_TO, "app.AppScope").replacing("app.Old");

        let interface = DeclarationEvent::new("app.Api", DeclarationShape::Interface);
        let contributions = handler.contributions(&interface, &args).unwrap();
        assert_eq!(contributions[0].kind, ContributionKind::BindingInterface);
        assert!(contributions[0].replaces.contains(&DeclarationId::from("app.Old")));

        let module = DeclarationEvent::new("app.NetworkModule", DeclarationShape::Module);
        let contributions = handler.contributions(&module, &args).unwrap();
        assert_eq!(contributions[0].kind, ContributionKind::Module);
    }

    #[test]
    fn test_contributes_to_rejects_classes() {
        let handler = ContributesToHandler::new();
        let class = DeclarationEvent::new("app.Impl", DeclarationShape::Class);

        let err = handler
            .contributions(&class, &AnnotationArguments::new(CONTRIBUTES_TO, "app.AppScope"))
            .unwrap_err();
        assert!(err.to_string().contains("neither an interface nor a module"));
    }

    #[test]
    fn test_binding_infers_single_supertype() {
        let handler = ContributesBindingHandler::new();
        let declaration = DeclarationEvent::new("app.RealAuth", DeclarationShape::Class)
            .with_supertype("app.Authenticator");
        let args = AnnotationArguments::new(CONTRIBUTES_BINDING, "app.AppScope")
            .with_priority(Priority::Highest)
            .with_qualifier("prod");

        let contribution = handler.contributions(&declaration, &args).unwrap().remove(0);
        assert_eq!(contribution.bound_type, Some(TypeId::from("app.Authenticator")));
        assert_eq!(contribution.priority, Priority::Highest);
        assert_eq!(contribution.qualifier_key.as_deref(), Some("prod"));
        assert!(contribution.validate().is_ok());
    }

    #[test]
    fn test_binding_without_inferable_bound_type() {
        let handler = ContributesBindingHandler::new();
        let declaration = DeclarationEvent::new("app.Impl", DeclarationShape::Class)
            .with_supertype("app.One")
            .with_supertype("app.Two");

        let err = handler
            .contributions(
                &declaration,
                &AnnotationArguments::new(CONTRIBUTES_BINDING, "app.AppScope"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::MissingBoundType { supertypes: 2, .. }));

        let explicit = AnnotationArguments::new(CONTRIBUTES_BINDING, "app.AppScope")
            .with_bound_type("app.Two");
        assert!(handler.contributions(&declaration, &explicit).is_ok());
    }

    #[test]
    fn test_multibinding_ignores_qualifier_on_request() {
        let handler = ContributesMultibindingHandler::new();
        let declaration = DeclarationEvent::new("app.Listener", DeclarationShape::Object)
            .with_supertype("app.EventListener");
        let args = AnnotationArguments::new(CONTRIBUTES_MULTIBINDING, "app.AppScope")
            .with_qualifier("named")
            .ignoring_qualifier();

        let contribution = handler.contributions(&declaration, &args).unwrap().remove(0);
        assert!(contribution.is_multibinding);
        assert_eq!(contribution.qualifier_key, None);
    }
}
