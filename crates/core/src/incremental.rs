//! Incremental consistency
//!
//! Exports are byte-stable, so two exports of the same unit can be compared
//! marker by marker. A [`ChangeSet`] tells a caller which downstream merge
//! points need reprocessing; merging itself always starts from the complete
//! closure and never consults it.

use crate::error::{Error, Result};
use crate::store::MetadataMarker;
use crate::store::metadata::parse_key;
use crate::types::{MergePoint, ScopeId, UnitId};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Differences between two exports of one unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Marker keys present only in the new export
    pub added: Vec<String>,
    /// Marker keys present only in the old export
    pub removed: Vec<String>,
    /// Marker keys whose payload changed
    pub changed: Vec<String>,
    /// Scopes touched by any of the above
    pub affected_scopes: BTreeSet<ScopeId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Whether a merge point downstream of the diffed unit must be reprocessed
    pub fn affects(&self, merge_point: &MergePoint) -> bool {
        self.affected_scopes.contains(&merge_point.scope)
    }
}

/// Compare two exports by marker key
pub fn diff(old: &[MetadataMarker], new: &[MetadataMarker]) -> Result<ChangeSet> {
    let old: BTreeMap<&str, &str> = by_key(old);
    let new: BTreeMap<&str, &str> = by_key(new);

    let mut changes = ChangeSet::default();
    for (key, payload) in &new {
        match old.get(key) {
            None => changes.added.push((*key).to_string()),
            Some(previous) if previous != payload => changes.changed.push((*key).to_string()),
            Some(_) => {}
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            changes.removed.push((*key).to_string());
        }
    }

    for key in changes
        .added
        .iter()
        .chain(&changes.removed)
        .chain(&changes.changed)
    {
        let (_, _, scope) = parse_key(key).ok_or_else(|| Error::MalformedMetadata {
            key: key.clone(),
            reason: "key is not of the form <kind>:<declaration>@<scope>".to_string(),
        })?;
        changes.affected_scopes.insert(ScopeId::new(scope));
    }

    Ok(changes)
}

/// md5 hex digest over the keys and payloads of an export
pub fn fingerprint(markers: &[MetadataMarker]) -> String {
    let mut sorted: Vec<&MetadataMarker> = markers.iter().collect();
    sorted.sort();

    let mut bytes = Vec::new();
    for marker in sorted {
        bytes.extend_from_slice(marker.key.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(marker.payload.as_bytes());
        bytes.push(b'\n');
    }
    format!("{:x}", md5::compute(&bytes))
}

fn by_key(markers: &[MetadataMarker]) -> BTreeMap<&str, &str> {
    markers
        .iter()
        .map(|m| (m.key.as_str(), m.payload.as_str()))
        .collect()
}

/// Remembers the last export of every unit
#[derive(Debug, Default)]
pub struct ConsistencyTracker {
    exports: Mutex<HashMap<UnitId, Vec<MetadataMarker>>>,
}

impl ConsistencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new export of `unit` and return what changed since the last one
    pub fn track(&self, unit: &UnitId, markers: Vec<MetadataMarker>) -> Result<ChangeSet> {
        let mut exports = self.exports.lock();
        let previous = exports.get(unit).map(Vec::as_slice).unwrap_or(&[]);
        let changes = diff(previous, &markers)?;

        debug!(
            "Unit {}: {} added, {} removed, {} changed markers",
            unit,
            changes.added.len(),
            changes.removed.len(),
            changes.changed.len()
        );
        exports.insert(unit.clone(), markers);
        Ok(changes)
    }

    /// Fingerprint of the last export tracked for `unit`
    pub fn fingerprint_of(&self, unit: &UnitId) -> Option<String> {
        self.exports.lock().get(unit).map(|markers| fingerprint(markers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Contribution, Priority};

    fn marker(contribution: Contribution) -> MetadataMarker {
        MetadataMarker::encode(&"lib".into(), &contribution).unwrap()
    }

    #[test]
    fn test_diff_reports_added_removed_changed() {
        let old = vec![
            marker(Contribution::module("a.Kept", "s.One")),
            marker(Contribution::module("a.Gone", "s.Two")),
            marker(Contribution::binding("a.Impl", "s.Three", "a.Api")),
        ];
        let new = vec![
            marker(Contribution::module("a.Kept", "s.One")),
            marker(Contribution::binding("a.Impl", "s.Three", "a.Api").with_priority(Priority::High)),
            marker(Contribution::interface("a.New", "s.Four")),
        ];

        let changes = diff(&old, &new).unwrap();
        assert_eq!(changes.added, vec!["binding_interface:a.New@s.Four"]);
        assert_eq!(changes.removed, vec!["module:a.Gone@s.Two"]);
        assert_eq!(changes.changed, vec!["binding:a.Impl@s.Three"]);
        assert_eq!(
            changes.affected_scopes,
            BTreeSet::from([
                ScopeId::from("s.Four"),
                ScopeId::from("s.Three"),
                ScopeId::from("s.Two")
            ])
        );

        assert!(changes.affects(&MergePoint::new("c.Component", "s.Two")));
        assert!(!changes.affects(&MergePoint::new("c.Component", "s.One")));
    }

    #[test]
    fn test_identical_exports() {
        let export = vec![marker(Contribution::module("a.M", "s.S"))];
        let changes = diff(&export, &export.clone()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(fingerprint(&export), fingerprint(&export.clone()));
    }

    #[test]
    fn test_fingerprint_ignores_marker_order() {
        let a = marker(Contribution::module("a.M", "s.S"));
        let b = marker(Contribution::module("b.M", "s.S"));

        let forward = fingerprint(&[a.clone(), b.clone()]);
        assert_eq!(forward, fingerprint(&[b, a]));
        assert_eq!(forward.len(), 32);
        assert_ne!(forward, fingerprint(&[]));
    }

    #[test]
    fn test_tracker_compares_with_previous_export() {
        let tracker = ConsistencyTracker::new();
        let unit = UnitId::from("lib");

        let first = tracker
            .track(&unit, vec![marker(Contribution::module("a.M", "s.S"))])
            .unwrap();
        assert_eq!(first.added.len(), 1);

        let second = tracker
            .track(&unit, vec![marker(Contribution::module("a.M", "s.S"))])
            .unwrap();
        assert!(second.is_empty());
        assert!(tracker.fingerprint_of(&unit).is_some());
        assert!(tracker.fingerprint_of(&"other".into()).is_none());
    }
}
