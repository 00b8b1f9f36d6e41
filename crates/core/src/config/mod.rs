//! Configuration for merging
//!
//! Settings are read from `.scopemerge.json` or `scopemerge.json` files (see
//! [`ConfigLoader`]) or assembled programmatically with [`ConfigBuilder`].

pub mod loader;

pub use loader::ConfigLoader;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of upstream units whose decoded markers stay memoized
pub const DEFAULT_UPSTREAM_CACHE_CAPACITY: usize = 64;

/// Recognized config file names, checked in this order in every directory
pub const CONFIG_FILE_NAMES: [&str; 2] = [".scopemerge.json", "scopemerge.json"];

/// Effective merge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reject exclusions of declarations not contributed to the merge point's scope
    pub strict_exclusions: bool,
    /// Reject merge points that include and exclude the same declaration
    pub check_include_exclude: bool,
    /// Capacity of the upstream decode memo, in units
    pub upstream_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict_exclusions: true,
            check_include_exclude: true,
            upstream_cache_capacity: DEFAULT_UPSTREAM_CACHE_CAPACITY,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Override the fields set in `layer`
    pub fn merge(&mut self, layer: JsonConfig) {
        if let Some(strict) = layer.strict_exclusions {
            self.strict_exclusions = strict;
        }
        if let Some(check) = layer.check_include_exclude {
            self.check_include_exclude = check;
        }
        if let Some(capacity) = layer.upstream_cache_capacity {
            self.upstream_cache_capacity = capacity;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream_cache_capacity == 0 {
            return Err(Error::ConfigError(
                "upstream_cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One config file; unset fields leave farther files' values in place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_exclusions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_include_exclude: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_cache_capacity: Option<usize>,
}

impl JsonConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn strict_exclusions(mut self, strict: bool) -> Self {
        self.config.strict_exclusions = strict;
        self
    }

    pub fn check_include_exclude(mut self, check: bool) -> Self {
        self.config.check_include_exclude = check;
        self
    }

    pub fn upstream_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.upstream_cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
