//! Contribution record store
//!
//! Per-unit storage of contributions, the versioned metadata markers they are
//! exported as, and the read-only view of markers exported by upstream units.

pub mod index;
pub mod metadata;
pub mod record_store;
pub mod upstream;

pub use index::ContributionIndex;
pub use metadata::{DecodedMarker, METADATA_FORMAT_VERSION, MetadataMarker};
pub use record_store::ContributionStore;
pub use upstream::UpstreamMetadata;
