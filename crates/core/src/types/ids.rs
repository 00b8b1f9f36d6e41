//! Identifier newtypes
//!
//! All identifiers are fully-qualified names compared lexically, so that every
//! ordered collection keyed by them iterates the same way on every run.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Fully-qualified name of a scope marker type
    ScopeId
);

define_id!(
    /// Fully-qualified name of an annotated declaration
    DeclarationId
);

define_id!(
    /// Fully-qualified name of a bound contract type
    TypeId
);

define_id!(
    /// Name of an independently compiled compilation unit
    UnitId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_lexically() {
        let mut ids: Vec<DeclarationId> = vec!["b.Module".into(), "a.Z".into(), "a.B".into()];
        ids.sort();
        assert_eq!(
            ids.iter().map(DeclarationId::as_str).collect::<Vec<_>>(),
            vec!["a.B", "a.Z", "b.Module"]
        );
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let scope = ScopeId::new("app.AppScope");
        assert_eq!(serde_json::to_string(&scope).unwrap(), r#""app.AppScope""#);

        let back: ScopeId = serde_json::from_str(r#""app.AppScope""#).unwrap();
        assert_eq!(back, scope);
    }
}
