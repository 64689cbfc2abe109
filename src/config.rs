//! Runtime configuration.
//!
//! Layers, lowest precedence first:
//!
//! 1. Built-in defaults ([`AtlasConfig::default`])
//! 2. `config.toml` in the platform config dir, or an explicit `--config` file
//! 3. Environment overrides (`ATLAS_*`, read through `dotenvy` so a `.env`
//!    file works too)
//!
//! ```toml
//! data_path = "/srv/atlas/policies.json"
//! session_file = "/tmp/atlas-session.json"
//!
//! [search]
//! threshold = 0.25
//! min_match_chars = 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::search::fuzzy::{DEFAULT_THRESHOLD, MIN_MATCH_CHARS, SearchOptions};

pub const ENV_DATA: &str = "ATLAS_DATA";
pub const ENV_SEARCH_THRESHOLD: &str = "ATLAS_SEARCH_THRESHOLD";
pub const ENV_MIN_MATCH_CHARS: &str = "ATLAS_MIN_MATCH_CHARS";
pub const ENV_SESSION_FILE: &str = "ATLAS_SESSION_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 0.0 accepts only exact substrings, 1.0 accepts anything.
    pub threshold: f64,
    pub min_match_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_match_chars: MIN_MATCH_CHARS,
        }
    }
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            threshold: self.threshold.clamp(0.0, 1.0),
            min_match_chars: self.min_match_chars.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// External dataset; the embedded dataset is used when unset.
    pub data_path: Option<PathBuf>,
    /// Where filter snapshots are remembered between runs.
    pub session_file: Option<PathBuf>,
    pub search: SearchConfig,
}

impl AtlasConfig {
    /// Resolve the full configuration.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| dotenvy::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    /// Apply `ATLAS_*` overrides from `lookup`. Unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DATA).filter(|v| !v.trim().is_empty()) {
            self.data_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            self.session_file = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_SEARCH_THRESHOLD) {
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => self.search.threshold = value.clamp(0.0, 1.0),
                _ => warn!(key = ENV_SEARCH_THRESHOLD, value = %raw, "ignoring invalid override"),
            }
        }
        if let Some(raw) = lookup(ENV_MIN_MATCH_CHARS) {
            match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => self.search.min_match_chars = value,
                _ => warn!(key = ENV_MIN_MATCH_CHARS, value = %raw, "ignoring invalid override"),
            }
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_file.clone().unwrap_or_else(default_session_path)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "policy-atlas", "policy-atlas")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn default_session_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("atlas-session.json"),
        |dirs| dirs.data_dir().join("session.json"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_search_defaults() {
        let config = AtlasConfig::default();
        assert_eq!(config.search.options(), SearchOptions::default());
        assert!(config.data_path.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\nthreshold = 0.2\n").unwrap();
        let config = AtlasConfig::from_file(&path).unwrap();
        assert!((config.search.threshold - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.search.min_match_chars, MIN_MATCH_CHARS);
        assert!(config.session_file.is_none());
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "search = [").unwrap();
        let err = AtlasConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AtlasConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AtlasConfig::default();
        config.apply_overrides(lookup(&[
            (ENV_DATA, "/data/p.json"),
            (ENV_SEARCH_THRESHOLD, "0.1"),
            (ENV_MIN_MATCH_CHARS, "3"),
            (ENV_SESSION_FILE, "/tmp/s.json"),
        ]));
        assert_eq!(config.data_path, Some(PathBuf::from("/data/p.json")));
        assert_eq!(config.session_path(), PathBuf::from("/tmp/s.json"));
        assert!((config.search.threshold - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.search.min_match_chars, 3);
    }

    #[test]
    fn invalid_overrides_are_ignored_or_clamped() {
        let mut config = AtlasConfig::default();
        config.apply_overrides(lookup(&[
            (ENV_SEARCH_THRESHOLD, "lots"),
            (ENV_MIN_MATCH_CHARS, "0"),
            (ENV_DATA, "  "),
        ]));
        assert_eq!(config, AtlasConfig::default());

        config.apply_overrides(lookup(&[(ENV_SEARCH_THRESHOLD, "7.5")]));
        assert!((config.search.threshold - 1.0).abs() < f64::EPSILON);
    }
}
