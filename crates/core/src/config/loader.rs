//! Configuration loader
//!
//! Walks from a starting path up to `SCOPEMERGE_ROOT` (or `$HOME` when unset),
//! collecting config files. Nearer files override farther ones.

use super::{CONFIG_FILE_NAMES, Config, JsonConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the outermost directory searched for config
pub const ROOT_ENV_VAR: &str = "SCOPEMERGE_ROOT";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory
    pub fn load() -> Result<Config> {
        match std::env::current_dir() {
            Ok(cwd) => Self::load_from_path(&cwd),
            Err(_) => Ok(Config::default()),
        }
    }

    /// Load configuration for `path`, bounded by `SCOPEMERGE_ROOT` or `$HOME`
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let boundary = std::env::var(ROOT_ENV_VAR)
            .ok()
            .or_else(|| std::env::var("HOME").ok())
            .map(PathBuf::from);
        Self::load_within(path, boundary.as_deref())
    }

    /// Load configuration for `path`, stopping at `boundary` when it is an ancestor
    pub fn load_within(path: &Path, boundary: Option<&Path>) -> Result<Config> {
        let mut check_path = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };

        // Nearest first
        let mut layers = Vec::new();
        loop {
            if let Some(layer) = Self::try_load(check_path)? {
                layers.push(layer);
            } else {
                tracing::debug!("No config at: {:?}", check_path);
            }

            if boundary.is_some_and(|root| check_path == root) {
                break;
            }

            match check_path.parent() {
                Some(parent) => check_path = parent,
                None => break,
            }
        }

        tracing::debug!("Found {} config files to merge", layers.len());
        let mut config = Config::default();
        for layer in layers.into_iter().rev() {
            config.merge(layer);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load a single config file
    pub fn load_file(path: &Path) -> Result<Config> {
        let mut config = Config::default();
        config.merge(Self::read_layer(path)?);
        config.validate()?;
        Ok(config)
    }

    fn try_load(dir: &Path) -> Result<Option<JsonConfig>> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                tracing::debug!("Found config at {:?}", path);
                return Self::read_layer(&path).map(Some);
            }
        }
        Ok(None)
    }

    fn read_layer(path: &Path) -> Result<JsonConfig> {
        let contents = std::fs::read_to_string(path)?;
        JsonConfig::from_json(&contents).map_err(|e| {
            tracing::error!("Failed to parse config from {:?}: {}", path, e);
            Error::ConfigError(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_nearer_config_overrides_farther() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let nested = root.join("units").join("app");
        fs::create_dir_all(&nested).unwrap();

        fs::write(
            root.join(".scopemerge.json"),
            r#"{"strict_exclusions": false, "upstream_cache_capacity": 8}"#,
        )
        .unwrap();
        fs::write(nested.join("scopemerge.json"), r#"{"upstream_cache_capacity": 2}"#).unwrap();

        let config = ConfigLoader::load_within(&nested, Some(root)).unwrap();
        assert!(!config.strict_exclusions);
        assert!(config.check_include_exclude);
        assert_eq!(config.upstream_cache_capacity, 2);
    }

    #[test]
    fn test_walk_stops_at_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let outer = temp_dir.path();
        let root = outer.join("project");
        fs::create_dir_all(&root).unwrap();
        fs::write(outer.join(".scopemerge.json"), r#"{"strict_exclusions": false}"#).unwrap();

        let config = ConfigLoader::load_within(&root, Some(&root)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".scopemerge.json"), "{ not json").unwrap();

        let err = ConfigLoader::load_within(temp_dir.path(), Some(temp_dir.path())).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
