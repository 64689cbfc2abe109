//! Remembered filter state between runs.
//!
//! Only facet state is kept, so a resumed session starts with an empty search
//! query. A missing or unreadable snapshot is never fatal: it means there is
//! nothing to resume.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::types::{AffectedPopulation, Country, EvidenceQuality, PolicyType};
use crate::search::filter::{FilterCriteria, YearRange};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to write session snapshot at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove session snapshot at {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode session snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted subset of [`FilterCriteria`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub countries: BTreeSet<Country>,
    pub policy_types: BTreeSet<PolicyType>,
    pub affected_populations: BTreeSet<AffectedPopulation>,
    pub evidence_quality: BTreeSet<EvidenceQuality>,
    pub active_only: bool,
    pub year_range: YearRange,
    /// Unix millis.
    pub saved_at: i64,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::from(&FilterCriteria::default())
    }
}

impl From<&FilterCriteria> for SessionSnapshot {
    fn from(criteria: &FilterCriteria) -> Self {
        Self {
            countries: criteria.countries.clone(),
            policy_types: criteria.policy_types.clone(),
            affected_populations: criteria.affected_populations.clone(),
            evidence_quality: criteria.evidence_quality.clone(),
            active_only: criteria.active_only,
            year_range: criteria.year_range,
            saved_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl SessionSnapshot {
    /// Criteria with this snapshot's facets and an empty search query.
    pub fn into_criteria(self) -> FilterCriteria {
        FilterCriteria {
            search_query: String::new(),
            countries: self.countries,
            policy_types: self.policy_types,
            affected_populations: self.affected_populations,
            evidence_quality: self.evidence_quality,
            active_only: self.active_only,
            year_range: self.year_range,
        }
    }
}

/// JSON file holding at most one snapshot.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<SessionSnapshot> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no session snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "discarding corrupt session snapshot");
                None
            }
        }
    }

    /// Write atomically: a crash mid-save leaves the previous snapshot intact.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Write {
            path: self.path.clone(),
            source,
        };
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(snapshot)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        debug!(path = %self.path.display(), "session_saved");
        Ok(())
    }

    /// Remove the snapshot. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
