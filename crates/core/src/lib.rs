//! scopemerge - scope-based contribution merging for dependency-injection graphs
//!
//! This crate provides functionality to:
//! - Record declarations contributed to named scopes, per compilation unit
//! - Export them as versioned metadata markers and read upstream markers back
//! - Resolve, replace and prioritize contributions for each merge point
//! - Synthesize the merged declaration and diff exports between builds
pub mod config;
pub mod conflict;
pub mod error;
pub mod incremental;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod sink;
pub mod store;
pub mod synthesizer;
pub mod types;
pub mod utils;
pub mod workspace;

// Re-export commonly used types and traits
pub use error::{Diagnostic, Error, Result};
pub use types::*;

// Re-export main API components
pub use config::{Config, ConfigBuilder, ConfigLoader};
pub use conflict::{ConflictEngine, ConflictResolution};
pub use incremental::{ChangeSet, ConsistencyTracker, diff, fingerprint};
pub use registry::{
    AnnotationArguments, ContributionHandler, DeclarationEvent, DeclarationShape,
    ExtensionRegistry, ExtensionRegistryBuilder, MergePointEvent,
};
pub use resolver::{ResolvedScope, ScopeResolver};
pub use session::UnitSession;
pub use sink::{CollectingSink, EmissionSink};
pub use store::{ContributionIndex, ContributionStore, MetadataMarker, UpstreamMetadata};
pub use synthesizer::AggregationSynthesizer;
pub use workspace::{UnitDescriptor, UnitOutput, Workspace, WorkspaceDescriptor, WorkspaceOutput};
