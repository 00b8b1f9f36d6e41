use super::index::ContributionIndex;
use super::metadata::MetadataMarker;
use super::upstream::UpstreamMetadata;
use crate::error::{Error, Result};
use crate::types::{Contribution, ContributionKey, ScopeId, UnitId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Contributions recorded by one compilation unit plus its upstream view
///
/// `record` may be called from many threads at once. Reads see every
/// contribution recorded before they started.
#[derive(Debug)]
pub struct ContributionStore {
    unit: UnitId,
    local: RwLock<BTreeMap<ContributionKey, Contribution>>,
    upstream: Arc<UpstreamMetadata>,
}

impl ContributionStore {
    /// Create a store with no upstream units
    pub fn new(unit: impl Into<UnitId>) -> Self {
        Self::with_upstream(unit, Arc::new(UpstreamMetadata::default()))
    }

    /// Create a store reading upstream contributions from `upstream`
    pub fn with_upstream(unit: impl Into<UnitId>, upstream: Arc<UpstreamMetadata>) -> Self {
        Self {
            unit: unit.into(),
            local: RwLock::new(BTreeMap::new()),
            upstream,
        }
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn upstream(&self) -> &Arc<UpstreamMetadata> {
        &self.upstream
    }

    /// Record a contribution declared in this unit
    pub fn record(&self, contribution: Contribution) -> Result<()> {
        contribution.validate()?;

        let key = contribution.key();
        let mut local = self.local.write();
        if local.contains_key(&key) {
            return Err(Error::DuplicateContribution {
                unit: self.unit.clone(),
                declaration: key.declaration,
                scope: key.scope,
                kind: key.kind,
            });
        }

        debug!(
            "Recording {} {} for scope {} in unit {}",
            key.kind, key.declaration, key.scope, self.unit
        );
        local.insert(key, contribution);
        Ok(())
    }

    /// Contributions declared in this unit, in canonical order
    pub fn local_contributions(&self) -> Vec<Contribution> {
        let mut contributions: Vec<_> = self.local.read().values().cloned().collect();
        contributions.sort();
        contributions
    }

    /// Local and upstream contributions to `scope`, duplicates collapsed
    pub fn contributions_for(&self, scope: &ScopeId) -> Result<Vec<Contribution>> {
        let mut unique: BTreeSet<Contribution> = self
            .local
            .read()
            .values()
            .filter(|c| c.scope == *scope)
            .cloned()
            .collect();

        for unit in self.upstream.units() {
            let upstream = self.upstream.contributions_of(&unit)?;
            unique.extend(upstream.iter().filter(|c| c.scope == *scope).cloned());
        }

        Ok(unique.into_iter().collect())
    }

    /// Indices over the whole visible closure, rebuilt on every call
    pub fn closure_index(&self) -> Result<ContributionIndex> {
        let mut closure = self.local_contributions();
        closure.extend(self.upstream.all_contributions()?);
        Ok(ContributionIndex::build(&closure))
    }

    /// Markers for the contributions declared in this unit, sorted by key
    pub fn export_metadata(&self) -> Result<Vec<MetadataMarker>> {
        let mut markers = self
            .local
            .read()
            .values()
            .map(|contribution| MetadataMarker::encode(&self.unit, contribution))
            .collect::<Result<Vec<_>>>()?;
        markers.sort();
        Ok(markers)
    }
}
