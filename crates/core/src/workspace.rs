//! Multi-unit workspace driver
//!
//! Builds a JSON description of several compilation units in dependency
//! order. Each unit sees the exported markers of all of its transitive
//! dependencies, never the markers of units it does not depend on.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::incremental::fingerprint;
use crate::registry::{DeclarationEvent, ExtensionRegistry, MergePointEvent};
use crate::session::UnitSession;
use crate::sink::CollectingSink;
use crate::store::{MetadataMarker, UpstreamMetadata};
use crate::types::{Contribution, MergedResult, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// One unit of a workspace description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub name: UnitId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<UnitId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<DeclarationEvent>,
    /// Contributions recorded directly, bypassing annotation handlers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<Contribution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_points: Vec<MergePointEvent>,
}

/// A workspace description: the units and how they depend on each other
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    pub units: Vec<UnitDescriptor>,
}

impl WorkspaceDescriptor {
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// Output of one built unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutput {
    pub unit: UnitId,
    pub results: Vec<MergedResult>,
    pub metadata: Vec<MetadataMarker>,
    /// md5 fingerprint of `metadata`
    pub fingerprint: String,
}

/// Output of a whole workspace, in build order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceOutput {
    pub units: Vec<UnitOutput>,
}

impl WorkspaceOutput {
    pub fn unit(&self, name: &UnitId) -> Option<&UnitOutput> {
        self.units.iter().find(|output| output.unit == *name)
    }
}

pub struct Workspace {
    units: BTreeMap<UnitId, UnitDescriptor>,
    registry: Arc<ExtensionRegistry>,
    config: Config,
}

impl Workspace {
    /// Create a workspace with the default registry and configuration
    pub fn new(descriptor: WorkspaceDescriptor) -> Result<Self> {
        let mut units = BTreeMap::new();
        for unit in descriptor.units {
            if units.contains_key(&unit.name) {
                return Err(Error::ConfigError(format!(
                    "workspace declares unit {} more than once",
                    unit.name
                )));
            }
            units.insert(unit.name.clone(), unit);
        }

        Ok(Self {
            units,
            registry: Arc::new(ExtensionRegistry::new()),
            config: Config::default(),
        })
    }

    /// Load a workspace description from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(WorkspaceDescriptor::load(path)?)
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Units ordered so that every unit follows its dependencies
    pub fn build_order(&self) -> Result<Vec<UnitId>> {
        let mut order = Vec::new();
        let mut finished = BTreeSet::new();
        for name in self.units.keys() {
            let mut path = Vec::new();
            self.visit(name, &mut path, &mut finished, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        name: &UnitId,
        path: &mut Vec<UnitId>,
        finished: &mut BTreeSet<UnitId>,
        order: &mut Vec<UnitId>,
    ) -> Result<()> {
        if finished.contains(name) {
            return Ok(());
        }
        if let Some(position) = path.iter().position(|on_path| on_path == name) {
            let mut cycle = path[position..].to_vec();
            cycle.push(name.clone());
            return Err(Error::UnitDependencyCycle { cycle });
        }

        let descriptor = &self.units[name];
        let mut dependencies: Vec<&UnitId> = descriptor.dependencies.iter().collect();
        dependencies.sort();
        dependencies.dedup();
        if dependencies.len() != descriptor.dependencies.len() {
            warn!("Unit {} lists the same dependency more than once", name);
        }

        path.push(name.clone());
        for dependency in dependencies {
            if !self.units.contains_key(dependency) {
                return Err(Error::UnknownUnit {
                    unit: name.clone(),
                    dependency: dependency.clone(),
                });
            }
            self.visit(dependency, path, finished, order)?;
        }
        path.pop();

        finished.insert(name.clone());
        order.push(name.clone());
        Ok(())
    }

    /// Transitive dependencies of a unit, lexically ordered
    pub fn transitive_dependencies(&self, name: &UnitId) -> BTreeSet<UnitId> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&UnitId> = self
            .units
            .get(name)
            .map(|unit| unit.dependencies.iter().collect())
            .unwrap_or_default();

        while let Some(next) = pending.pop() {
            if seen.insert(next.clone()) {
                if let Some(unit) = self.units.get(next) {
                    pending.extend(unit.dependencies.iter());
                }
            }
        }
        seen
    }

    /// Build every unit in dependency order
    pub fn build(&self) -> Result<WorkspaceOutput> {
        let mut output = WorkspaceOutput::default();
        let mut exported: BTreeMap<UnitId, Vec<MetadataMarker>> = BTreeMap::new();

        for name in self.build_order()? {
            let upstream = Arc::new(UpstreamMetadata::new(self.config.upstream_cache_capacity));
            for dependency in self.transitive_dependencies(&name) {
                let markers = exported.get(&dependency).cloned().unwrap_or_default();
                upstream.append(dependency, markers)?;
            }

            let unit_output = self.build_unit(&self.units[&name], upstream)?;
            exported.insert(name, unit_output.metadata.clone());
            output.units.push(unit_output);
        }

        Ok(output)
    }

    fn build_unit(
        &self,
        descriptor: &UnitDescriptor,
        upstream: Arc<UpstreamMetadata>,
    ) -> Result<UnitOutput> {
        let session = UnitSession::with_upstream(
            descriptor.name.clone(),
            upstream,
            Arc::clone(&self.registry),
            self.config.clone(),
        );

        for event in &descriptor.declarations {
            session.on_declaration(event)?;
        }
        for contribution in &descriptor.contributions {
            session.record(contribution.clone())?;
        }
        for event in &descriptor.merge_points {
            session.on_merge_point(event.clone().into_merge_point())?;
        }

        let mut sink = CollectingSink::new();
        session.merge_all(&mut sink)?;
        let metadata = session.export_metadata()?;
        let fingerprint = fingerprint(&metadata);

        info!(
            "Built unit {} ({} markers, fingerprint {})",
            descriptor.name,
            metadata.len(),
            fingerprint
        );

        Ok(UnitOutput {
            unit: descriptor.name.clone(),
            results: sink.into_results(),
            metadata,
            fingerprint,
        })
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
