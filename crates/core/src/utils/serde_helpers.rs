//! Serde utility helpers for case-insensitive deserialization

/// Macro to implement case-insensitive deserialization for fieldless enums
///
/// Metadata written by older producers and hand-written workspace files spell
/// enum tags in any case (`"HIGH"`, `"High"`, `"high"`); all of them map to the
/// same variant.
///
/// Usage:
/// ```ignore
/// impl_case_insensitive_deserialize!(
///     Priority,
///     Normal => "normal",
///     High => "high"
/// );
/// ```
#[macro_export]
macro_rules! impl_case_insensitive_deserialize {
    ($enum_type:ty, $($variant:ident => $str_val:literal),+ $(,)?) => {
        impl<'de> serde::Deserialize<'de> for $enum_type {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                match s.to_lowercase().as_str() {
                    $(
                        $str_val => Ok(Self::$variant),
                    )+
                    _ => Err(serde::de::Error::custom(format!(
                        "unknown variant '{}', expected one of: {}",
                        s,
                        [$($str_val),+].join(", ")
                    ))),
                }
            }
        }
    };
}
