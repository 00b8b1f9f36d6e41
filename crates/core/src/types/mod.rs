pub mod contribution;
pub mod ids;
pub mod merge_point;
pub mod merged;

// Re-export commonly used types
pub use contribution::{BindingKey, Contribution, ContributionKey, ContributionKind, Priority};
pub use ids::{DeclarationId, ScopeId, TypeId, UnitId};
pub use merge_point::{MergeKind, MergePoint};
pub use merged::{MergedResult, Provenance};
