//! Extension registry for contribution handlers
//!
//! Maps capability tags (annotation names) to the handlers that turn
//! declaration events into contributions. Populated explicitly at startup.

pub mod events;
pub mod handlers;

pub use events::{AnnotationArguments, DeclarationEvent, DeclarationShape, MergePointEvent};
pub use handlers::{
    CONTRIBUTES_BINDING, CONTRIBUTES_MULTIBINDING, CONTRIBUTES_TO, ContributesBindingHandler,
    ContributesMultibindingHandler, ContributesToHandler, ContributionHandler,
};

use crate::error::Result;
use crate::types::Contribution;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of contribution handlers keyed by annotation
#[derive(Clone)]
pub struct ExtensionRegistry {
    handlers: HashMap<String, Vec<Arc<dyn ContributionHandler>>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("annotations", &self.list_annotations())
            .finish()
    }
}

impl ExtensionRegistry {
    /// Create a new registry with the default handlers
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        registry.register_handler(Arc::new(ContributesToHandler::new()));
        registry.register_handler(Arc::new(ContributesBindingHandler::new()));
        registry.register_handler(Arc::new(ContributesMultibindingHandler::new()));

        registry
    }

    /// Register a handler under its annotation
    pub fn register_handler(&mut self, handler: Arc<dyn ContributionHandler>) {
        self.handlers
            .entry(handler.annotation().to_string())
            .or_default()
            .push(handler);
    }

    /// Handlers registered for an annotation, in registration order
    pub fn handlers_for(&self, annotation: &str) -> &[Arc<dyn ContributionHandler>] {
        self.handlers
            .get(annotation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check if any handler is registered for an annotation
    pub fn contains(&self, annotation: &str) -> bool {
        self.handlers.contains_key(annotation)
    }

    /// All annotations with a handler, sorted
    pub fn list_annotations(&self) -> Vec<&str> {
        let mut annotations: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        annotations.sort_unstable();
        annotations
    }

    /// Contributions produced by every handled annotation of `event`
    pub fn contributions(&self, event: &DeclarationEvent) -> Result<Vec<Contribution>> {
        let mut contributions = Vec::new();
        for arguments in &event.annotations {
            let handlers = self.handlers_for(&arguments.annotation);
            if handlers.is_empty() {
                tracing::debug!(
                    "No handler for @{} on {}, skipping",
                    arguments.annotation,
                    event.declaration
                );
                continue;
            }
            for handler in handlers {
                contributions.extend(handler.contributions(event, arguments)?);
            }
        }
        Ok(contributions)
    }

    /// Create a registry from a custom handler map
    pub fn from_handlers(handlers: HashMap<String, Vec<Arc<dyn ContributionHandler>>>) -> Self {
        Self { handlers }
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating custom registries
#[derive(Default)]
pub struct ExtensionRegistryBuilder {
    handlers: HashMap<String, Vec<Arc<dyn ContributionHandler>>>,
}

impl ExtensionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler to the builder
    pub fn with_handler(mut self, handler: Arc<dyn ContributionHandler>) -> Self {
        self.handlers
            .entry(handler.annotation().to_string())
            .or_default()
            .push(handler);
        self
    }

    /// Add the default handlers
    pub fn with_defaults(self) -> Self {
        self.with_handler(Arc::new(ContributesToHandler::new()))
            .with_handler(Arc::new(ContributesBindingHandler::new()))
            .with_handler(Arc::new(ContributesMultibindingHandler::new()))
    }

    /// Build the registry
    pub fn build(self) -> ExtensionRegistry {
        ExtensionRegistry::from_handlers(self.handlers)
    }
}
