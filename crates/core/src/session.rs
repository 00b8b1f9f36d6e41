//! Unit session
//!
//! The in-process stand-in for one compilation unit of the host compiler:
//! declaration events are recorded (possibly from several threads), merge
//! points are registered, and merging runs the resolver, conflict engine and
//! synthesizer for every merge point before anything is emitted.

use crate::config::Config;
use crate::conflict::ConflictEngine;
use crate::error::{Error, Result};
use crate::registry::{DeclarationEvent, ExtensionRegistry};
use crate::resolver::ScopeResolver;
use crate::sink::EmissionSink;
use crate::store::{ContributionStore, MetadataMarker, UpstreamMetadata};
use crate::synthesizer::AggregationSynthesizer;
use crate::types::{Contribution, DeclarationId, MergePoint, MergedResult, UnitId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct UnitSession {
    store: ContributionStore,
    registry: Arc<ExtensionRegistry>,
    config: Config,
    merge_points: RwLock<BTreeMap<DeclarationId, MergePoint>>,
}

impl UnitSession {
    /// Create a session for a unit without upstream dependencies
    pub fn new(unit: impl Into<UnitId>, registry: Arc<ExtensionRegistry>, config: Config) -> Self {
        let upstream = Arc::new(UpstreamMetadata::new(config.upstream_cache_capacity));
        Self::with_upstream(unit, upstream, registry, config)
    }

    /// Create a session reading upstream contributions from `upstream`
    pub fn with_upstream(
        unit: impl Into<UnitId>,
        upstream: Arc<UpstreamMetadata>,
        registry: Arc<ExtensionRegistry>,
        config: Config,
    ) -> Self {
        Self {
            store: ContributionStore::with_upstream(unit, upstream),
            registry,
            config,
            merge_points: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn unit(&self) -> &UnitId {
        self.store.unit()
    }

    pub fn store(&self) -> &ContributionStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record the contributions of every handled annotation on `event`
    pub fn on_declaration(&self, event: &DeclarationEvent) -> Result<usize> {
        let contributions = self.registry.contributions(event)?;
        let count = contributions.len();
        for contribution in contributions {
            self.store.record(contribution)?;
        }
        Ok(count)
    }

    /// Record a contribution produced outside the registry
    pub fn record(&self, contribution: Contribution) -> Result<()> {
        self.store.record(contribution)
    }

    /// Register a merge point of this unit
    pub fn on_merge_point(&self, merge_point: MergePoint) -> Result<()> {
        let mut merge_points = self.merge_points.write();
        if merge_points.contains_key(&merge_point.declaration_id) {
            return Err(Error::DuplicateMergePoint {
                unit: self.unit().clone(),
                declaration: merge_point.declaration_id,
            });
        }

        debug!(
            "Registered merge point {} for scope {} in unit {}",
            merge_point.declaration_id,
            merge_point.scope,
            self.unit()
        );
        merge_points.insert(merge_point.declaration_id.clone(), merge_point);
        Ok(())
    }

    /// Registered merge points, lexical by declaration id
    pub fn merge_points(&self) -> Vec<MergePoint> {
        self.merge_points.read().values().cloned().collect()
    }

    /// Merge one merge point against the current closure
    pub fn merge(&self, merge_point: &MergePoint) -> Result<MergedResult> {
        let resolved = ScopeResolver::new(&self.store, &self.config).resolve(merge_point)?;
        let resolution = ConflictEngine::new().resolve(&resolved)?;
        Ok(AggregationSynthesizer::new().synthesize(merge_point, &resolution))
    }

    /// Merge every registered merge point; fails on the first error
    pub fn merge_results(&self) -> Result<Vec<MergedResult>> {
        self.merge_points()
            .iter()
            .map(|merge_point| self.merge(merge_point))
            .collect()
    }

    /// Merge every merge point, then emit all results, or nothing on error
    pub fn merge_all(&self, sink: &mut dyn EmissionSink) -> Result<usize> {
        let results = self.merge_results()?;
        let count = results.len();
        for result in results {
            sink.emit(result)?;
        }

        info!("Unit {}: emitted {} merged declarations", self.unit(), count);
        Ok(count)
    }

    /// Markers for the contributions declared in this unit
    pub fn export_metadata(&self) -> Result<Vec<MetadataMarker>> {
        self.store.export_metadata()
    }
}

impl std::fmt::Debug for UnitSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSession")
            .field("unit", self.unit())
            .field("merge_points", &self.merge_points.read().len())
            .field("config", &self.config)
            .finish()
    }
}
