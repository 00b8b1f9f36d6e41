//! Read-only view of metadata exported by upstream units
//!
//! Markers are appended once per unit and never rewritten. A unit's markers
//! are decoded the first time its contributions are requested, and the
//! decoded list is memoized in an LRU cache shared behind an `Arc`.

use super::metadata::MetadataMarker;
use crate::config::DEFAULT_UPSTREAM_CACHE_CAPACITY;
use crate::error::{Error, Result};
use crate::types::{Contribution, UnitId};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Append-only log of upstream markers with a memoized decoder
pub struct UpstreamMetadata {
    log: RwLock<Vec<(UnitId, Arc<[MetadataMarker]>)>>,
    decoded: Mutex<LruCache<UnitId, Arc<Vec<Contribution>>>>,
}

impl UpstreamMetadata {
    /// Create an empty log whose decode memo holds at most `capacity` units
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            log: RwLock::new(Vec::new()),
            decoded: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Append the markers exported by `unit`
    pub fn append(&self, unit: UnitId, markers: Vec<MetadataMarker>) -> Result<()> {
        let mut log = self.log.write();
        if log.iter().any(|(existing, _)| *existing == unit) {
            return Err(Error::DuplicateUpstreamUnit(unit));
        }

        debug!("Appending {} upstream markers from unit {}", markers.len(), unit);
        log.push((unit, markers.into()));
        Ok(())
    }

    /// Upstream units in append order
    pub fn units(&self) -> Vec<UnitId> {
        self.log.read().iter().map(|(unit, _)| unit.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }

    /// Number of units whose decoded contributions are currently memoized
    pub fn decoded_units(&self) -> usize {
        self.decoded.lock().len()
    }

    /// Contributions declared by one upstream unit, decoded on first access
    pub fn contributions_of(&self, unit: &UnitId) -> Result<Arc<Vec<Contribution>>> {
        if let Some(cached) = self.decoded.lock().get(unit) {
            return Ok(Arc::clone(cached));
        }

        let markers = {
            let log = self.log.read();
            match log.iter().find(|(existing, _)| existing == unit) {
                Some((_, markers)) => Arc::clone(markers),
                None => return Ok(Arc::new(Vec::new())),
            }
        };

        debug!("Decoding {} markers of upstream unit {}", markers.len(), unit);
        let mut contributions = Vec::with_capacity(markers.len());
        for marker in markers.iter() {
            let decoded = marker.decode()?;
            if decoded.unit != *unit {
                return Err(Error::MalformedMetadata {
                    key: marker.key.clone(),
                    reason: format!(
                        "marker belongs to unit {} but was appended for unit {}",
                        decoded.unit, unit
                    ),
                });
            }
            contributions.push(decoded.contribution);
        }
        contributions.sort();

        let contributions = Arc::new(contributions);
        self.decoded.lock().put(unit.clone(), Arc::clone(&contributions));
        Ok(contributions)
    }

    /// Contributions of every upstream unit, in append order of their units
    pub fn all_contributions(&self) -> Result<Vec<Contribution>> {
        let mut all = Vec::new();
        for unit in self.units() {
            all.extend(self.contributions_of(&unit)?.iter().cloned());
        }
        Ok(all)
    }
}

impl Default for UpstreamMetadata {
    fn default() -> Self {
        Self::new(DEFAULT_UPSTREAM_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for UpstreamMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamMetadata")
            .field("units", &self.units())
            .field("decoded_units", &self.decoded_units())
            .finish()
    }
}
