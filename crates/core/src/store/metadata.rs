//! Versioned metadata markers
//!
//! Every contribution a unit declares is exported as one marker. The key
//! identifies the contribution (`<kind>:<declaration>@<scope>`), the payload
//! is compact JSON with a fixed field order:
//!
//! ```json
//! {"version":1,"unit":"network","contribution":{...}}
//! ```

use crate::error::{Error, Result};
use crate::types::{Contribution, ContributionKind, UnitId};
use serde::{Deserialize, Serialize};

/// Payload format written by this version
pub const METADATA_FORMAT_VERSION: u32 = 1;

/// Serialized record of one contribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetadataMarker {
    pub key: String,
    pub payload: String,
}

/// A marker decoded back into its contribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMarker {
    pub unit: UnitId,
    pub contribution: Contribution,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    version: u32,
    unit: &'a UnitId,
    contribution: &'a Contribution,
}

#[derive(Deserialize)]
struct Payload {
    unit: UnitId,
    contribution: Contribution,
}

/// Marker key for a contribution
pub fn marker_key(contribution: &Contribution) -> String {
    format!(
        "{}:{}@{}",
        contribution.kind.tag(),
        contribution.source_declaration_id,
        contribution.scope
    )
}

/// Split a marker key into kind, declaration and scope
pub fn parse_key(key: &str) -> Option<(ContributionKind, &str, &str)> {
    let (tag, rest) = key.split_once(':')?;
    let kind = ContributionKind::from_tag(tag)?;
    let (declaration, scope) = rest.rsplit_once('@')?;
    if declaration.is_empty() || scope.is_empty() {
        return None;
    }
    Some((kind, declaration, scope))
}

impl MetadataMarker {
    /// Encode a contribution declared in `unit`
    pub fn encode(unit: &UnitId, contribution: &Contribution) -> Result<Self> {
        let payload = serde_json::to_string(&PayloadRef {
            version: METADATA_FORMAT_VERSION,
            unit,
            contribution,
        })?;

        Ok(Self {
            key: marker_key(contribution),
            payload,
        })
    }

    /// Decode the payload, checking its version and that it agrees with the key
    pub fn decode(&self) -> Result<DecodedMarker> {
        let malformed = |reason: String| Error::MalformedMetadata {
            key: self.key.clone(),
            reason,
        };

        let value: serde_json::Value = serde_json::from_str(&self.payload)
            .map_err(|e| malformed(format!("payload is not valid JSON: {e}")))?;

        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| malformed("payload has no format version".to_string()))?;

        if version != u64::from(METADATA_FORMAT_VERSION) {
            let unit = value
                .get("unit")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            return Err(Error::UnsupportedMetadataVersion {
                unit: UnitId::new(unit),
                key: self.key.clone(),
                found: u32::try_from(version).unwrap_or(u32::MAX),
                expected: METADATA_FORMAT_VERSION,
            });
        }

        let payload: Payload = serde_json::from_value(value)
            .map_err(|e| malformed(format!("payload does not describe a contribution: {e}")))?;

        let expected_key = marker_key(&payload.contribution);
        if expected_key != self.key {
            return Err(malformed(format!(
                "payload describes {expected_key} instead"
            )));
        }

        payload.contribution.validate()?;

        Ok(DecodedMarker {
            unit: payload.unit,
            contribution: payload.contribution,
        })
    }
}
